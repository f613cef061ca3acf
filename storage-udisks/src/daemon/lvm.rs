use std::collections::HashMap;

use async_trait::async_trait;
use storage_contracts::{LvmOpsAdapter, StorageError};
use storage_types::{RemoveDeviceOptions, ResizeOptions, TearDown};
use tracing::info;
use zbus::zvariant::Value;

use super::{UDisksDaemon, object_path};
use crate::DiskError;
use crate::convert::{CallOptions, tear_down_options};
use crate::dbus::proxies::{UDisks2LogicalVolumeProxy, UDisks2VolumeGroupProxy};

impl UDisksDaemon {
    async fn vgroup_proxy(&self, path: &str) -> Result<UDisks2VolumeGroupProxy<'static>, DiskError> {
        Ok(UDisks2VolumeGroupProxy::builder(&self.connection)
            .path(object_path(path)?)?
            .build()
            .await?)
    }

    async fn lvol_proxy(&self, path: &str) -> Result<UDisks2LogicalVolumeProxy<'static>, DiskError> {
        Ok(UDisks2LogicalVolumeProxy::builder(&self.connection)
            .path(object_path(path)?)?
            .build()
            .await?)
    }
}

#[async_trait]
impl LvmOpsAdapter for UDisksDaemon {
    async fn vg_rename(&self, vgroup: &str, new_name: &str) -> Result<String, StorageError> {
        let proxy = self.vgroup_proxy(vgroup).await?;
        let renamed = proxy
            .rename(new_name, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("VolumeGroup.Rename", e))?;
        info!(vgroup, new_name, "renamed volume group");
        Ok(renamed.as_str().to_string())
    }

    async fn vg_delete(
        &self,
        vgroup: &str,
        wipe: bool,
        options: TearDown,
    ) -> Result<(), StorageError> {
        let proxy = self.vgroup_proxy(vgroup).await?;
        proxy
            .delete(wipe, tear_down_options(options.tear_down))
            .await
            .map_err(|e| DiskError::from_call("VolumeGroup.Delete", e))?;
        info!(vgroup, "deleted volume group");
        Ok(())
    }

    async fn vg_create_plain_volume(
        &self,
        vgroup: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError> {
        let proxy = self.vgroup_proxy(vgroup).await?;
        let created = proxy
            .create_plain_volume(name, size, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("VolumeGroup.CreatePlainVolume", e))?;
        info!(vgroup, name, size, "created logical volume");
        Ok(created.as_str().to_string())
    }

    async fn vg_create_thin_pool_volume(
        &self,
        vgroup: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError> {
        let proxy = self.vgroup_proxy(vgroup).await?;
        let created = proxy
            .create_thin_pool_volume(name, size, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("VolumeGroup.CreateThinPoolVolume", e))?;
        info!(vgroup, name, size, "created thin pool");
        Ok(created.as_str().to_string())
    }

    async fn vg_create_thin_volume(
        &self,
        vgroup: &str,
        name: &str,
        size: u64,
        pool: &str,
    ) -> Result<String, StorageError> {
        let proxy = self.vgroup_proxy(vgroup).await?;
        let pool_path = object_path(pool)?;
        let created = proxy
            .create_thin_volume(name, size, &pool_path, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("VolumeGroup.CreateThinVolume", e))?;
        info!(vgroup, pool, name, size, "created thin volume");
        Ok(created.as_str().to_string())
    }

    async fn vg_add_device(&self, vgroup: &str, block: &str) -> Result<(), StorageError> {
        let proxy = self.vgroup_proxy(vgroup).await?;
        let device = object_path(block)?;
        proxy
            .add_device(&device, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("VolumeGroup.AddDevice", e))?;
        info!(vgroup, block, "added physical volume");
        Ok(())
    }

    async fn vg_remove_device(
        &self,
        vgroup: &str,
        block: &str,
        options: RemoveDeviceOptions,
    ) -> Result<(), StorageError> {
        let proxy = self.vgroup_proxy(vgroup).await?;
        let device = object_path(block)?;
        proxy
            .remove_device(&device, options.wipe, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("VolumeGroup.RemoveDevice", e))?;
        info!(vgroup, block, "removed physical volume");
        Ok(())
    }

    async fn vg_empty_device(&self, vgroup: &str, block: &str) -> Result<(), StorageError> {
        let proxy = self.vgroup_proxy(vgroup).await?;
        let device = object_path(block)?;
        proxy
            .empty_device(&device, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("VolumeGroup.EmptyDevice", e))?;
        Ok(())
    }

    async fn vg_poll(&self, vgroup: &str) -> Result<(), StorageError> {
        let proxy = self.vgroup_proxy(vgroup).await?;
        proxy
            .poll()
            .await
            .map_err(|e| DiskError::from_call("VolumeGroup.Poll", e))?;
        Ok(())
    }

    async fn lv_resize(
        &self,
        lvol: &str,
        new_size: u64,
        options: ResizeOptions,
    ) -> Result<(), StorageError> {
        let proxy = self.lvol_proxy(lvol).await?;
        let mut dict = CallOptions::new();
        if options.resize_fsys {
            dict.insert("resize_fsys", Value::from(true));
        }
        proxy
            .resize(new_size, dict)
            .await
            .map_err(|e| DiskError::from_call("LogicalVolume.Resize", e))?;
        info!(lvol, new_size, "resized logical volume");
        Ok(())
    }

    async fn lv_rename(&self, lvol: &str, new_name: &str) -> Result<String, StorageError> {
        let proxy = self.lvol_proxy(lvol).await?;
        let renamed = proxy
            .rename(new_name, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("LogicalVolume.Rename", e))?;
        Ok(renamed.as_str().to_string())
    }

    async fn lv_create_snapshot(
        &self,
        lvol: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError> {
        let proxy = self.lvol_proxy(lvol).await?;
        let created = proxy
            .create_snapshot(name, size, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("LogicalVolume.CreateSnapshot", e))?;
        info!(lvol, name, size, "created snapshot");
        Ok(created.as_str().to_string())
    }

    async fn lv_activate(&self, lvol: &str) -> Result<String, StorageError> {
        let proxy = self.lvol_proxy(lvol).await?;
        let block = proxy
            .activate(HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("LogicalVolume.Activate", e))?;
        Ok(block.as_str().to_string())
    }

    async fn lv_deactivate(&self, lvol: &str) -> Result<(), StorageError> {
        let proxy = self.lvol_proxy(lvol).await?;
        proxy
            .deactivate(HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("LogicalVolume.Deactivate", e))?;
        Ok(())
    }

    async fn lv_delete(&self, lvol: &str, options: TearDown) -> Result<(), StorageError> {
        let proxy = self.lvol_proxy(lvol).await?;
        proxy
            .delete(tear_down_options(options.tear_down))
            .await
            .map_err(|e| DiskError::from_call("LogicalVolume.Delete", e))?;
        info!(lvol, "deleted logical volume");
        Ok(())
    }
}
