//! UDisks2 over D-Bus
//!
//! Loads the daemon's object tree into a [`storage_types::StorageSnapshot`],
//! reports changes as a stream and implements the calls of
//! [`storage_contracts::StorageDaemon`].

mod convert;
mod dbus;

pub mod daemon;
pub mod error;
pub mod parse;
pub mod snapshot;
pub mod watcher;

pub use storage_types;

pub use daemon::UDisksDaemon;
pub use dbus::bytestring::{decode_c_string_bytes, decode_mount_points, encode_bytestring};
pub use error::DiskError;
pub use parse::{ManagedObjects, build_snapshot};
pub use snapshot::load_snapshot;
pub use watcher::{ChangeWatcher, StorageEvent};
