pub mod bytestring;
pub mod proxies;
