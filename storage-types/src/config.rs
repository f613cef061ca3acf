//! Persistent configuration items (fstab / crypttab)
//!
//! UDisks2 reports these on `Block.Configuration` as `a(sa{sv})`; string
//! values are NUL-terminated byte arrays. The records here carry decoded
//! strings, the daemon client does the byte-string conversion.

use serde::{Deserialize, Serialize};

/// One `/etc/fstab` line tracked by the daemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FstabEntry {
    /// Device spec as written in fstab ("UUID=..."); filled in by the daemon
    pub fsname: String,

    /// Mount point
    pub dir: String,

    /// Filesystem type ("auto" when created here)
    pub fs_type: String,

    /// Mount options
    pub opts: String,

    pub freq: i32,
    pub passno: i32,

    /// Ask the daemon to keep `x-parent` options up to date
    pub track_parents: bool,
}

impl FstabEntry {
    /// Entry for a user-chosen mount point; empty options become "defaults".
    pub fn custom(dir: impl Into<String>, opts: &str) -> Self {
        let opts = opts.trim();
        Self {
            fsname: String::new(),
            dir: dir.into(),
            fs_type: "auto".to_string(),
            opts: if opts.is_empty() {
                "defaults".to_string()
            } else {
                opts.to_string()
            },
            freq: 0,
            passno: 0,
            track_parents: true,
        }
    }
}

/// One `/etc/crypttab` line tracked by the daemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrypttabEntry {
    /// Mapper name, if any
    pub name: String,

    /// Device spec as written in crypttab; filled in by the daemon
    pub device: String,

    pub options: String,

    /// Passphrase file path (only present in secret configuration)
    pub passphrase_path: String,

    /// Stored passphrase; empty when the passphrase is not kept on disk
    pub passphrase_contents: String,

    pub track_parents: bool,
}

impl CrypttabEntry {
    pub fn new(options: &str, passphrase_contents: Option<&str>) -> Self {
        Self {
            options: options.trim().to_string(),
            passphrase_contents: passphrase_contents.unwrap_or_default().to_string(),
            track_parents: true,
            ..Default::default()
        }
    }
}

/// A configuration item as carried on a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigItem {
    Fstab(FstabEntry),
    Crypttab(CrypttabEntry),

    /// A kind this client does not know how to edit
    Other { kind: String },
}

impl ConfigItem {
    /// The type string UDisks2 uses for this item
    pub fn kind(&self) -> &str {
        match self {
            Self::Fstab(_) => "fstab",
            Self::Crypttab(_) => "crypttab",
            Self::Other { kind } => kind,
        }
    }
}
