// SPDX-License-Identifier: GPL-3.0-only

//! Typed records for the objects the storage daemon exports
//!
//! Every UDisks2 interface the detail view reads has one record type here.
//! [`StorageSnapshot`] holds all of them keyed by object path and provides
//! the lookups and reverse indexes the view needs:
//!
//! - **storage-udisks**: fills a snapshot from `GetManagedObjects`
//! - **storage-details**: renders trees and menus from a snapshot
//! - **storage-app**: prints what storage-details renders
//!
//! Nothing in this crate talks to D-Bus, so everything built on it can be
//! tested with hand-made snapshots.

pub mod block;
pub mod common;
pub mod config;
pub mod drive;
pub mod lvm;
pub mod mdraid;
pub mod options;
pub mod partition;
pub mod snapshot;

pub use block::{BlockRecord, EncryptedRecord, FilesystemRecord, IdUsage};
pub use common::{
    ByteRange, GIB, MIB, MIN_FREE_SPACE_BYTES, fmt_size, fmt_size_long, format_temperature,
    parse_size, round_up, split_options, strip_parent_options,
};
pub use config::{ConfigItem, CrypttabEntry, FstabEntry};
pub use drive::{
    DriveAtaRecord, DriveRecord, JobRecord, ManagerRecord, format_remaining,
};
pub use lvm::{
    BlockLvm2Record, LogicalVolumeRecord, LogicalVolumeType, LvmNameError, PhysicalVolumeRecord,
    VolumeGroupRecord, validate_lvm2_name,
};
pub use mdraid::{ActiveDevice, MdRaidRecord};
pub use options::{
    DiskPartitioning, EraseMode, FormatOptions, MdRaidStartOptions, RemoveDeviceOptions,
    ResizeOptions, TearDown,
};
pub use partition::{
    DOS_EXTENDED_TYPE, PartitionRecord, PartitionTableRecord, PartitionTableType,
};
pub use snapshot::{ObjectRecord, StorageSnapshot};
