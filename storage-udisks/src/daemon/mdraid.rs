use std::collections::HashMap;

use async_trait::async_trait;
use storage_contracts::{MdRaidOpsAdapter, StorageError};
use storage_types::{MdRaidStartOptions, RemoveDeviceOptions, TearDown};
use tracing::info;
use zbus::zvariant::Value;

use super::{UDisksDaemon, object_path};
use crate::DiskError;
use crate::convert::{CallOptions, tear_down_options};
use crate::dbus::bytestring::encode_bytestring;
use crate::dbus::proxies::UDisks2MDRaidProxy;

impl UDisksDaemon {
    async fn mdraid_proxy(&self, path: &str) -> Result<UDisks2MDRaidProxy<'static>, DiskError> {
        Ok(UDisks2MDRaidProxy::builder(&self.connection)
            .path(object_path(path)?)?
            .build()
            .await?)
    }
}

#[async_trait]
impl MdRaidOpsAdapter for UDisksDaemon {
    async fn mdraid_start(
        &self,
        mdraid: &str,
        options: MdRaidStartOptions,
    ) -> Result<(), StorageError> {
        let proxy = self.mdraid_proxy(mdraid).await?;
        let mut dict = CallOptions::new();
        if options.start_degraded {
            dict.insert("start-degraded", Value::from(true));
        }
        proxy
            .start(dict)
            .await
            .map_err(|e| DiskError::from_call("MDRaid.Start", e))?;
        info!(mdraid, "started array");
        Ok(())
    }

    async fn mdraid_stop(&self, mdraid: &str) -> Result<(), StorageError> {
        let proxy = self.mdraid_proxy(mdraid).await?;
        proxy
            .stop(HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("MDRaid.Stop", e))?;
        info!(mdraid, "stopped array");
        Ok(())
    }

    async fn mdraid_request_sync_action(
        &self,
        mdraid: &str,
        action: &str,
    ) -> Result<(), StorageError> {
        let proxy = self.mdraid_proxy(mdraid).await?;
        proxy
            .request_sync_action(action, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("MDRaid.RequestSyncAction", e))?;
        info!(mdraid, action, "requested sync action");
        Ok(())
    }

    async fn mdraid_set_bitmap_location(
        &self,
        mdraid: &str,
        location: &str,
    ) -> Result<(), StorageError> {
        let proxy = self.mdraid_proxy(mdraid).await?;
        proxy
            .set_bitmap_location(&encode_bytestring(location), HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("MDRaid.SetBitmapLocation", e))?;
        Ok(())
    }

    async fn mdraid_add_device(&self, mdraid: &str, block: &str) -> Result<(), StorageError> {
        let proxy = self.mdraid_proxy(mdraid).await?;
        let device = object_path(block)?;
        proxy
            .add_device(&device, HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("MDRaid.AddDevice", e))?;
        info!(mdraid, block, "added member");
        Ok(())
    }

    async fn mdraid_remove_device(
        &self,
        mdraid: &str,
        block: &str,
        options: RemoveDeviceOptions,
    ) -> Result<(), StorageError> {
        let proxy = self.mdraid_proxy(mdraid).await?;
        let device = object_path(block)?;
        let mut dict = CallOptions::new();
        if options.wipe {
            dict.insert("wipe", Value::from(true));
        }
        proxy
            .remove_device(&device, dict)
            .await
            .map_err(|e| DiskError::from_call("MDRaid.RemoveDevice", e))?;
        info!(mdraid, block, "removed member");
        Ok(())
    }

    async fn mdraid_delete(&self, mdraid: &str, options: TearDown) -> Result<(), StorageError> {
        let proxy = self.mdraid_proxy(mdraid).await?;
        proxy
            .delete(tear_down_options(options.tear_down))
            .await
            .map_err(|e| DiskError::from_call("MDRaid.Delete", e))?;
        info!(mdraid, "deleted array");
        Ok(())
    }
}
