// SPDX-License-Identifier: GPL-3.0-only

pub mod block;
pub mod discovery;
pub mod job;
pub mod lvm;
pub mod mdraid;

pub use block::BlockOpsAdapter;
pub use discovery::SnapshotSource;
pub use job::JobOpsAdapter;
pub use lvm::LvmOpsAdapter;
pub use mdraid::MdRaidOpsAdapter;

/// Every remote call the detail view makes
pub trait StorageDaemon:
    BlockOpsAdapter + MdRaidOpsAdapter + LvmOpsAdapter + JobOpsAdapter
{
}

impl<T> StorageDaemon for T where
    T: BlockOpsAdapter + MdRaidOpsAdapter + LvmOpsAdapter + JobOpsAdapter
{
}
