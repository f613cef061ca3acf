// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use storage_types::{MdRaidStartOptions, RemoveDeviceOptions, TearDown};

use crate::StorageError;

#[async_trait]
pub trait MdRaidOpsAdapter: Send + Sync {
    async fn mdraid_start(
        &self,
        mdraid: &str,
        options: MdRaidStartOptions,
    ) -> Result<(), StorageError>;

    async fn mdraid_stop(&self, mdraid: &str) -> Result<(), StorageError>;

    /// "check", "repair" or "idle"
    async fn mdraid_request_sync_action(
        &self,
        mdraid: &str,
        action: &str,
    ) -> Result<(), StorageError>;

    /// "internal" or "none"
    async fn mdraid_set_bitmap_location(
        &self,
        mdraid: &str,
        location: &str,
    ) -> Result<(), StorageError>;

    async fn mdraid_add_device(&self, mdraid: &str, block: &str) -> Result<(), StorageError>;

    async fn mdraid_remove_device(
        &self,
        mdraid: &str,
        block: &str,
        options: RemoveDeviceOptions,
    ) -> Result<(), StorageError>;

    /// Fails with [`crate::StorageErrorKind::Unsupported`] on daemons
    /// without `MDRaid.Delete`.
    async fn mdraid_delete(&self, mdraid: &str, options: TearDown) -> Result<(), StorageError>;
}
