// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use storage_types::{RemoveDeviceOptions, ResizeOptions, TearDown};

use crate::StorageError;

/// `VolumeGroup` and `LogicalVolume` calls
#[async_trait]
pub trait LvmOpsAdapter: Send + Sync {
    /// Returns the new object path of the group
    async fn vg_rename(&self, vgroup: &str, new_name: &str) -> Result<String, StorageError>;

    async fn vg_delete(
        &self,
        vgroup: &str,
        wipe: bool,
        options: TearDown,
    ) -> Result<(), StorageError>;

    async fn vg_create_plain_volume(
        &self,
        vgroup: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError>;

    async fn vg_create_thin_pool_volume(
        &self,
        vgroup: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError>;

    /// Provision a thin volume from `pool`, a pool volume of this group
    async fn vg_create_thin_volume(
        &self,
        vgroup: &str,
        name: &str,
        size: u64,
        pool: &str,
    ) -> Result<String, StorageError>;

    async fn vg_add_device(&self, vgroup: &str, block: &str) -> Result<(), StorageError>;

    async fn vg_remove_device(
        &self,
        vgroup: &str,
        block: &str,
        options: RemoveDeviceOptions,
    ) -> Result<(), StorageError>;

    /// Move all extents off a physical volume
    async fn vg_empty_device(&self, vgroup: &str, block: &str) -> Result<(), StorageError>;

    /// Refresh the size properties of a group that needs polling
    async fn vg_poll(&self, vgroup: &str) -> Result<(), StorageError>;

    async fn lv_resize(
        &self,
        lvol: &str,
        new_size: u64,
        options: ResizeOptions,
    ) -> Result<(), StorageError>;

    async fn lv_rename(&self, lvol: &str, new_name: &str) -> Result<String, StorageError>;

    async fn lv_create_snapshot(
        &self,
        lvol: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError>;

    /// Returns the block of the activated volume
    async fn lv_activate(&self, lvol: &str) -> Result<String, StorageError>;

    async fn lv_deactivate(&self, lvol: &str) -> Result<(), StorageError>;

    async fn lv_delete(&self, lvol: &str, options: TearDown) -> Result<(), StorageError>;
}
