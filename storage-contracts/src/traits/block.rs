// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use storage_types::{ConfigItem, FormatOptions, TearDown};

use crate::StorageError;

/// Calls on block objects and the interfaces that live on them
/// (`Block`, `PartitionTable`, `Partition`, `Filesystem`, `Encrypted`).
#[async_trait]
pub trait BlockOpsAdapter: Send + Sync {
    /// `Block.Format`; `fs_type` may also be "dos", "gpt" or "empty"
    async fn format(
        &self,
        block: &str,
        fs_type: &str,
        options: &FormatOptions,
    ) -> Result<(), StorageError>;

    async fn add_configuration_item(
        &self,
        block: &str,
        item: &ConfigItem,
    ) -> Result<(), StorageError>;

    async fn update_configuration_item(
        &self,
        block: &str,
        old: &ConfigItem,
        new: &ConfigItem,
    ) -> Result<(), StorageError>;

    async fn remove_configuration_item(
        &self,
        block: &str,
        item: &ConfigItem,
    ) -> Result<(), StorageError>;

    /// Configuration including stored secrets (passphrase contents)
    async fn secret_configuration(&self, block: &str) -> Result<Vec<ConfigItem>, StorageError>;

    /// Returns the object path of the new partition
    async fn create_partition(
        &self,
        table_block: &str,
        offset: u64,
        size: u64,
        type_id: &str,
        name: &str,
    ) -> Result<String, StorageError>;

    #[allow(clippy::too_many_arguments)]
    async fn create_partition_and_format(
        &self,
        table_block: &str,
        offset: u64,
        size: u64,
        type_id: &str,
        name: &str,
        fs_type: &str,
        options: &FormatOptions,
    ) -> Result<String, StorageError>;

    async fn delete_partition(
        &self,
        partition: &str,
        options: TearDown,
    ) -> Result<(), StorageError>;

    /// Returns the mount point
    async fn mount(&self, filesystem: &str) -> Result<String, StorageError>;

    async fn unmount(&self, filesystem: &str) -> Result<(), StorageError>;

    async fn set_label(&self, filesystem: &str, label: &str) -> Result<(), StorageError>;

    async fn lock(&self, encrypted: &str) -> Result<(), StorageError>;

    /// Returns the cleartext block
    async fn unlock(&self, encrypted: &str, passphrase: &str) -> Result<String, StorageError>;
}
