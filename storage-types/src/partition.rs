//! Partition and partition table records

use serde::{Deserialize, Serialize};

use crate::ByteRange;

/// Partition table type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionTableType {
    /// GPT (GUID Partition Table)
    #[default]
    Gpt,

    /// MBR/DOS (Master Boot Record)
    Mbr,

    /// Anything else the daemon reports (e.g. "apm")
    Other(String),
}

impl PartitionTableType {
    /// Convert to UDisks2 string format
    pub fn as_udisks_str(&self) -> &str {
        match self {
            Self::Gpt => "gpt",
            Self::Mbr => "dos",
            Self::Other(other) => other,
        }
    }

    /// Parse from UDisks2 string format
    pub fn from_udisks(s: &str) -> Self {
        match s {
            "gpt" => Self::Gpt,
            "dos" | "mbr" => Self::Mbr,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_dos(&self) -> bool {
        matches!(self, Self::Mbr)
    }
}

/// `org.freedesktop.UDisks2.PartitionTable`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTableRecord {
    pub path: String,
    pub table_type: PartitionTableType,
}

/// `org.freedesktop.UDisks2.Partition`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRecord {
    pub path: String,

    /// Object path of the partitioned block that holds the table
    pub table: String,

    /// Offset from the start of the table's device in bytes
    pub offset: u64,

    /// Size in bytes
    pub size: u64,

    /// Partition number (1-based)
    pub number: u32,

    pub name: String,

    /// Partition type identifier (GPT GUID or MBR type code)
    pub type_id: String,

    /// An MBR extended partition that holds logical partitions
    pub is_container: bool,

    /// A logical partition inside an extended partition
    pub is_contained: bool,
}

impl PartitionRecord {
    pub fn extent(&self) -> ByteRange {
        ByteRange::new(self.offset, self.size)
    }

    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

/// MBR type code for an extended partition
pub const DOS_EXTENDED_TYPE: &str = "0x05";
