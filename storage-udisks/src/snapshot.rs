//! Loading the full object tree in one round trip

use storage_types::{ManagerRecord, StorageSnapshot};
use tracing::debug;
use zbus::{Connection, fdo::ObjectManagerProxy};

use crate::DiskError;
use crate::dbus::proxies::{UDISKS2_ROOT, UDISKS2_SERVICE, UDisks2ManagerProxy};
use crate::parse::{ManagedObjects, build_snapshot};

/// Read every UDisks2 object and the manager properties.
pub async fn load_snapshot(connection: &Connection) -> Result<StorageSnapshot, DiskError> {
    let proxy = ObjectManagerProxy::builder(connection)
        .destination(UDISKS2_SERVICE)
        .map_err(|error| DiskError::DBusError(error.to_string()))?
        .path(UDISKS2_ROOT)
        .map_err(|error| DiskError::DBusError(error.to_string()))?
        .build()
        .await
        .map_err(|error| DiskError::DBusError(error.to_string()))?;

    let managed = proxy
        .get_managed_objects()
        .await
        .map_err(|error| DiskError::DBusError(error.to_string()))?;

    let mut objects = ManagedObjects::new();
    for (object_path, interfaces) in managed {
        let entry = objects.entry(object_path.as_str().to_string()).or_default();
        for (interface, properties) in interfaces {
            entry.insert(interface.as_str().to_string(), properties);
        }
    }

    let mut snapshot = build_snapshot(&objects);
    snapshot.manager = load_manager(connection).await;

    debug!(
        blocks = snapshot.blocks.len(),
        volume_groups = snapshot.volume_groups.len(),
        mdraids = snapshot.mdraids.len(),
        jobs = snapshot.jobs.len(),
        "loaded UDisks2 snapshot"
    );

    Ok(snapshot)
}

async fn load_manager(connection: &Connection) -> ManagerRecord {
    let proxy = match UDisks2ManagerProxy::new(connection).await {
        Ok(proxy) => proxy,
        Err(e) => {
            debug!("UDisks2 manager not available: {e}");
            return ManagerRecord::default();
        }
    };

    let version = proxy.version().await.unwrap_or_else(|e| {
        debug!("failed to read manager Version: {e}");
        String::new()
    });
    let supported_filesystems = proxy.supported_filesystems().await.unwrap_or_else(|e| {
        debug!("failed to read manager SupportedFilesystems: {e}");
        Vec::new()
    });

    ManagerRecord {
        version,
        supported_filesystems,
    }
}
