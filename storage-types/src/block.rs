//! Block device records
//!
//! One record per `org.freedesktop.UDisks2.Block` object plus the optional
//! `Filesystem` and `Encrypted` interfaces that live on the same object.

use serde::{Deserialize, Serialize};

use crate::config::ConfigItem;

/// What the daemon detected on a block device (`IdUsage`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdUsage {
    Filesystem,
    Raid,
    Crypto,
    Other,
    #[default]
    Unknown,
}

impl IdUsage {
    pub fn from_udisks(value: &str) -> Self {
        match value {
            "filesystem" => Self::Filesystem,
            "raid" => Self::Raid,
            "crypto" => Self::Crypto,
            "other" => Self::Other,
            _ => Self::Unknown,
        }
    }

    pub fn as_udisks_str(self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Raid => "raid",
            Self::Crypto => "crypto",
            Self::Other => "other",
            Self::Unknown => "",
        }
    }
}

/// `org.freedesktop.UDisks2.Block`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Object path of this block
    pub path: String,

    /// Kernel device file (e.g. "/dev/sda1")
    pub device: String,

    /// Device file to show to users (may be a /dev/mapper or /dev/md link)
    pub preferred_device: String,

    /// Size in bytes
    pub size: u64,

    pub read_only: bool,

    pub id_usage: IdUsage,

    /// Detected type (e.g. "ext4", "crypto_LUKS", "LVM2_member")
    pub id_type: String,

    /// Filesystem label
    pub id_label: String,

    /// Owning drive object, if any
    pub drive: Option<String>,

    /// The RAID array this block *is*
    pub mdraid: Option<String>,

    /// The RAID array this block is a member *of*
    pub mdraid_member: Option<String>,

    /// For a cleartext device, the encrypted block it was unlocked from
    pub crypto_backing_device: Option<String>,

    /// Persistent fstab/crypttab configuration tracked by the daemon
    pub configuration: Vec<ConfigItem>,
}

impl BlockRecord {
    /// Name to show for this block: the preferred device file, or the kernel one.
    pub fn name(&self) -> &str {
        if self.preferred_device.is_empty() {
            &self.device
        } else {
            &self.preferred_device
        }
    }

    /// Whether `name` ("sda", "/dev/sda", "mapper/luks-...") refers to this block
    pub fn matches_dev_name(&self, name: &str) -> bool {
        let full = if name.starts_with('/') {
            name.to_string()
        } else {
            format!("/dev/{name}")
        };
        self.device == full || self.preferred_device == full
    }

    pub fn is_filesystem(&self) -> bool {
        self.id_usage == IdUsage::Filesystem
    }

    pub fn is_crypto(&self) -> bool {
        self.id_usage == IdUsage::Crypto
    }

    pub fn fstab_entry(&self) -> Option<&crate::config::FstabEntry> {
        self.configuration.iter().find_map(|item| match item {
            ConfigItem::Fstab(entry) => Some(entry),
            _ => None,
        })
    }
}

/// `org.freedesktop.UDisks2.Filesystem`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemRecord {
    pub path: String,

    /// Current mount points (empty if not mounted)
    pub mount_points: Vec<String>,
}

impl FilesystemRecord {
    pub fn is_mounted(&self) -> bool {
        !self.mount_points.is_empty()
    }
}

/// `org.freedesktop.UDisks2.Encrypted`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    pub path: String,

    /// Cleartext block when unlocked (only reported by newer daemons)
    pub cleartext_device: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_name_matches_short_and_full_forms() {
        let block = BlockRecord {
            device: "/dev/dm-3".to_string(),
            preferred_device: "/dev/mapper/luks-1234".to_string(),
            ..Default::default()
        };

        assert!(block.matches_dev_name("dm-3"));
        assert!(block.matches_dev_name("/dev/mapper/luks-1234"));
        assert!(block.matches_dev_name("mapper/luks-1234"));
        assert!(!block.matches_dev_name("sda"));
        assert_eq!(block.name(), "/dev/mapper/luks-1234");
    }

    #[test]
    fn id_usage_parses_daemon_strings() {
        assert_eq!(IdUsage::from_udisks("crypto"), IdUsage::Crypto);
        assert_eq!(IdUsage::from_udisks(""), IdUsage::Unknown);
        assert_eq!(IdUsage::Raid.as_udisks_str(), "raid");
    }
}
