//! Option sets passed along with daemon calls
//!
//! Each struct maps to the `a{sv}` dictionary of one method family. The
//! daemon client turns them into D-Bus values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigItem;

/// How to wipe a device before formatting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraseMode {
    /// Leave existing data in place
    #[default]
    No,

    /// Overwrite with zeros (slow)
    Zero,
}

impl EraseMode {
    /// Value for the `erase` option, `None` when no erase is wanted
    pub fn as_option(self) -> Option<&'static str> {
        match self {
            Self::No => None,
            Self::Zero => Some("zero"),
        }
    }
}

/// Options for `Block.Format` and `PartitionTable.CreatePartitionAndFormat`
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Return as soon as the device is wiped, let mkfs run as a job
    pub no_block: bool,

    /// Check that the device is not in use before touching it
    pub dry_run_first: bool,

    /// Stop and remove whatever uses the device first
    pub tear_down: bool,

    pub erase: EraseMode,

    pub label: Option<String>,

    /// Create a LUKS container with this passphrase first
    pub encrypt_passphrase: Option<String>,

    /// fstab/crypttab items to create together with the filesystem
    pub config_items: Vec<ConfigItem>,
}

impl fmt::Debug for FormatOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatOptions")
            .field("no_block", &self.no_block)
            .field("dry_run_first", &self.dry_run_first)
            .field("tear_down", &self.tear_down)
            .field("erase", &self.erase)
            .field("label", &self.label)
            .field(
                "encrypt_passphrase",
                &self.encrypt_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .field("config_items", &self.config_items.len())
            .finish()
    }
}

/// `{ tear-down: b }` for delete calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TearDown {
    pub tear_down: bool,
}

impl TearDown {
    pub const YES: TearDown = TearDown { tear_down: true };
}

/// Options for `LogicalVolume.Resize`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOptions {
    /// Also grow or shrink the filesystem on the volume
    pub resize_fsys: bool,
}

/// Options for `MDRaid.Start`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdRaidStartOptions {
    pub start_degraded: bool,
}

/// Options for `MDRaid.RemoveDevice` and `VolumeGroup.RemoveDevice`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveDeviceOptions {
    /// Wipe the signature of the removed member
    pub wipe: bool,
}

/// Partitioning choice for formatting a whole disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskPartitioning {
    Dos,
    #[default]
    Gpt,
    Empty,
}

impl DiskPartitioning {
    pub fn as_udisks_str(self) -> &'static str {
        match self {
            Self::Dos => "dos",
            Self::Gpt => "gpt",
            Self::Empty => "empty",
        }
    }
}
