// SPDX-License-Identifier: GPL-3.0-only

//! The calls the detail view makes on the storage daemon
//!
//! Each trait covers one object family. [`StorageDaemon`] is implemented for
//! anything that implements all of them, so the UDisks2 client and test
//! doubles plug in the same way.

pub mod protocol;
pub mod traits;

pub use protocol::{StorageError, StorageErrorKind};
pub use traits::{
    BlockOpsAdapter, JobOpsAdapter, LvmOpsAdapter, MdRaidOpsAdapter, SnapshotSource,
    StorageDaemon,
};
