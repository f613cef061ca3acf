//! LVM (Logical Volume Manager) types
//!
//! Records for volume groups, logical volumes and physical volumes as
//! reported by the UDisks2 LVM2 module, plus LVM name validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `org.freedesktop.UDisks2.VolumeGroup`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeGroupRecord {
    pub path: String,

    /// Volume group name
    pub name: String,

    /// Volume group UUID
    pub uuid: String,

    /// Total size in bytes
    pub size: u64,

    /// Free space in bytes
    pub free_size: u64,

    /// Extent size in bytes
    pub extent_size: u64,

    /// Sizes are only refreshed when someone calls `Poll`
    pub needs_polling: bool,
}

impl VolumeGroupRecord {
    /// Get used space in bytes
    pub fn used(&self) -> u64 {
        self.size.saturating_sub(self.free_size)
    }
}

/// Logical volume kind (`LogicalVolume.Type`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalVolumeType {
    #[default]
    Block,
    Pool,
    Other,
}

impl LogicalVolumeType {
    pub fn from_udisks(value: &str) -> Self {
        match value {
            "block" => Self::Block,
            "pool" => Self::Pool,
            _ => Self::Other,
        }
    }
}

/// `org.freedesktop.UDisks2.LogicalVolume`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalVolumeRecord {
    pub path: String,

    /// Logical volume name
    pub name: String,

    pub uuid: String,

    /// Size in bytes
    pub size: u64,

    /// Whether the logical volume is active
    pub active: bool,

    pub lv_type: LogicalVolumeType,

    /// Parent volume group object
    pub volume_group: String,

    /// Thin pool this volume is provisioned from
    pub thin_pool: Option<String>,

    /// Origin of a snapshot
    pub origin: Option<String>,

    /// Fraction of the pool data area in use (pools only)
    pub data_allocated_ratio: f64,

    /// Fraction of the pool metadata area in use (pools only)
    pub metadata_allocated_ratio: f64,
}

impl LogicalVolumeRecord {
    pub fn is_pool(&self) -> bool {
        self.lv_type == LogicalVolumeType::Pool
    }

    /// Usage of a thin pool in percent, from the fuller of its two areas
    pub fn pool_usage_percent(&self) -> u32 {
        let ratio = self
            .data_allocated_ratio
            .max(self.metadata_allocated_ratio)
            .clamp(0.0, 1.0);
        (ratio * 100.0).round() as u32
    }
}

/// `org.freedesktop.UDisks2.PhysicalVolume` (on a block object)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalVolumeRecord {
    pub path: String,

    /// The volume group this PV belongs to
    pub volume_group: Option<String>,

    /// Size in bytes
    pub size: u64,

    /// Free space in bytes
    pub free_size: u64,
}

impl PhysicalVolumeRecord {
    pub fn used(&self) -> u64 {
        self.size.saturating_sub(self.free_size)
    }
}

/// `org.freedesktop.UDisks2.Block.LVM2` (links a block to its logical volume)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLvm2Record {
    pub path: String,
    pub logical_volume: Option<String>,
}

/// Why a name is not acceptable to LVM
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LvmNameError {
    #[error("Name cannot be empty.")]
    Empty,

    #[error("Name cannot be longer than 127 characters.")]
    TooLong,

    #[error("Name cannot contain the character '{0}'.")]
    InvalidCharacter(char),

    #[error("Name cannot start with a hyphen.")]
    LeadingHyphen,

    #[error("Name cannot be \"{0}\".")]
    Reserved(String),

    #[error("Name cannot contain \"{0}\".")]
    ReservedSubstring(&'static str),

    #[error("Name cannot start with \"{0}\".")]
    ReservedPrefix(&'static str),
}

const RESERVED_SUBSTRINGS: [&str; 11] = [
    "_cdata", "_cmeta", "_corig", "_mlog", "_mimage", "_pmspare", "_rimage", "_rmeta",
    "_tdata", "_tmeta", "_vorigin",
];

const RESERVED_PREFIXES: [&str; 2] = ["snapshot", "pvmove"];

/// Check a volume group or logical volume name against LVM's naming rules.
pub fn validate_lvm2_name(name: &str) -> Result<(), LvmNameError> {
    if name.is_empty() {
        return Err(LvmNameError::Empty);
    }
    if name.len() > 127 {
        return Err(LvmNameError::TooLong);
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-')))
    {
        return Err(LvmNameError::InvalidCharacter(c));
    }
    if name.starts_with('-') {
        return Err(LvmNameError::LeadingHyphen);
    }
    if name == "." || name == ".." {
        return Err(LvmNameError::Reserved(name.to_string()));
    }
    if let Some(sub) = RESERVED_SUBSTRINGS.iter().find(|s| name.contains(*s)) {
        return Err(LvmNameError::ReservedSubstring(sub));
    }
    if let Some(prefix) = RESERVED_PREFIXES.iter().find(|p| name.starts_with(*p)) {
        return Err(LvmNameError::ReservedPrefix(prefix));
    }
    Ok(())
}
