use std::collections::HashMap;

use async_trait::async_trait;
use storage_contracts::{BlockOpsAdapter, StorageError};
use storage_types::{ConfigItem, FormatOptions, TearDown};
use tracing::{debug, info};
use udisks2::{
    block::BlockProxy, encrypted::EncryptedProxy, filesystem::FilesystemProxy,
    partition::PartitionProxy, partitiontable::PartitionTableProxy,
};

use super::{UDisksDaemon, object_path};
use crate::DiskError;
use crate::convert::{
    config_item_from_dbus, config_item_to_dbus, format_options_to_dbus, tear_down_options,
};
use crate::dbus::proxies::UDisks2BlockConfigurationProxy;

impl UDisksDaemon {
    async fn block_proxy(&self, path: &str) -> Result<BlockProxy<'static>, DiskError> {
        Ok(BlockProxy::builder(&self.connection)
            .path(object_path(path)?)?
            .build()
            .await?)
    }

    async fn block_config_proxy(
        &self,
        path: &str,
    ) -> Result<UDisks2BlockConfigurationProxy<'static>, DiskError> {
        Ok(UDisks2BlockConfigurationProxy::builder(&self.connection)
            .path(object_path(path)?)?
            .build()
            .await?)
    }

    async fn filesystem_proxy(&self, path: &str) -> Result<FilesystemProxy<'static>, DiskError> {
        Ok(FilesystemProxy::builder(&self.connection)
            .path(object_path(path)?)?
            .build()
            .await?)
    }

    async fn encrypted_proxy(&self, path: &str) -> Result<EncryptedProxy<'static>, DiskError> {
        Ok(EncryptedProxy::builder(&self.connection)
            .path(object_path(path)?)?
            .build()
            .await?)
    }

    async fn partition_table_proxy(
        &self,
        path: &str,
    ) -> Result<PartitionTableProxy<'static>, DiskError> {
        Ok(PartitionTableProxy::builder(&self.connection)
            .path(object_path(path)?)?
            .build()
            .await?)
    }
}

#[async_trait]
impl BlockOpsAdapter for UDisksDaemon {
    async fn format(
        &self,
        block: &str,
        fs_type: &str,
        options: &FormatOptions,
    ) -> Result<(), StorageError> {
        info!(block, fs_type, ?options, "Block.Format");
        let proxy = self.block_proxy(block).await?;
        let dict = format_options_to_dbus(options)?;
        proxy
            .format(fs_type, dict)
            .await
            .map_err(|e| DiskError::from_call("Block.Format", e))?;
        Ok(())
    }

    async fn add_configuration_item(
        &self,
        block: &str,
        item: &ConfigItem,
    ) -> Result<(), StorageError> {
        debug!(block, kind = item.kind(), "Block.AddConfigurationItem");
        let proxy = self.block_config_proxy(block).await?;
        proxy
            .add_configuration_item(config_item_to_dbus(item)?, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("Block.AddConfigurationItem", e))?;
        Ok(())
    }

    async fn update_configuration_item(
        &self,
        block: &str,
        old: &ConfigItem,
        new: &ConfigItem,
    ) -> Result<(), StorageError> {
        debug!(block, kind = new.kind(), "Block.UpdateConfigurationItem");
        let proxy = self.block_config_proxy(block).await?;
        proxy
            .update_configuration_item(
                config_item_to_dbus(old)?,
                config_item_to_dbus(new)?,
                HashMap::new(),
            )
            .await
            .map_err(|e| DiskError::from_call("Block.UpdateConfigurationItem", e))?;
        Ok(())
    }

    async fn remove_configuration_item(
        &self,
        block: &str,
        item: &ConfigItem,
    ) -> Result<(), StorageError> {
        debug!(block, kind = item.kind(), "Block.RemoveConfigurationItem");
        let proxy = self.block_config_proxy(block).await?;
        proxy
            .remove_configuration_item(config_item_to_dbus(item)?, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("Block.RemoveConfigurationItem", e))?;
        Ok(())
    }

    async fn secret_configuration(&self, block: &str) -> Result<Vec<ConfigItem>, StorageError> {
        let proxy = self.block_config_proxy(block).await?;
        let items = proxy
            .get_secret_configuration(HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("Block.GetSecretConfiguration", e))?;
        Ok(items.iter().map(config_item_from_dbus).collect())
    }

    async fn create_partition(
        &self,
        table_block: &str,
        offset: u64,
        size: u64,
        type_id: &str,
        name: &str,
    ) -> Result<String, StorageError> {
        info!(table_block, offset, size, type_id, "PartitionTable.CreatePartition");
        let proxy = self.partition_table_proxy(table_block).await?;
        let created = proxy
            .create_partition(offset, size, type_id, name, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("PartitionTable.CreatePartition", e))?;
        Ok(created.as_str().to_string())
    }

    async fn create_partition_and_format(
        &self,
        table_block: &str,
        offset: u64,
        size: u64,
        type_id: &str,
        name: &str,
        fs_type: &str,
        options: &FormatOptions,
    ) -> Result<String, StorageError> {
        info!(
            table_block,
            offset,
            size,
            fs_type,
            ?options,
            "PartitionTable.CreatePartitionAndFormat"
        );
        let proxy = self.partition_table_proxy(table_block).await?;
        let format_options = format_options_to_dbus(options)?;
        let created = proxy
            .create_partition_and_format(
                offset,
                size,
                type_id,
                name,
                HashMap::new(),
                fs_type,
                format_options,
            )
            .await
            .map_err(|e| DiskError::from_call("PartitionTable.CreatePartitionAndFormat", e))?;
        Ok(created.as_str().to_string())
    }

    async fn delete_partition(
        &self,
        partition: &str,
        options: TearDown,
    ) -> Result<(), StorageError> {
        info!(partition, "Partition.Delete");
        let proxy = PartitionProxy::builder(&self.connection)
            .path(object_path(partition)?)
            .map_err(DiskError::from)?
            .build()
            .await
            .map_err(DiskError::from)?;
        proxy
            .delete(tear_down_options(options.tear_down))
            .await
            .map_err(|e| DiskError::from_call("Partition.Delete", e))?;
        Ok(())
    }

    async fn mount(&self, filesystem: &str) -> Result<String, StorageError> {
        let proxy = self.filesystem_proxy(filesystem).await?;
        let mount_point = proxy
            .mount(HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("Filesystem.Mount", e))?;
        info!(filesystem, mount_point, "mounted");
        Ok(mount_point)
    }

    async fn unmount(&self, filesystem: &str) -> Result<(), StorageError> {
        let proxy = self.filesystem_proxy(filesystem).await?;
        proxy
            .unmount(HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("Filesystem.Unmount", e))?;
        info!(filesystem, "unmounted");
        Ok(())
    }

    async fn set_label(&self, filesystem: &str, label: &str) -> Result<(), StorageError> {
        let proxy = self.filesystem_proxy(filesystem).await?;
        proxy
            .set_label(label, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("Filesystem.SetLabel", e))?;
        Ok(())
    }

    async fn lock(&self, encrypted: &str) -> Result<(), StorageError> {
        let proxy = self.encrypted_proxy(encrypted).await?;
        proxy
            .lock(HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("Encrypted.Lock", e))?;
        info!(encrypted, "locked");
        Ok(())
    }

    async fn unlock(&self, encrypted: &str, passphrase: &str) -> Result<String, StorageError> {
        let proxy = self.encrypted_proxy(encrypted).await?;
        let cleartext = proxy
            .unlock(passphrase, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("Encrypted.Unlock", e))?;
        info!(encrypted, cleartext = cleartext.as_str(), "unlocked");
        Ok(cleartext.as_str().to_string())
    }
}
