// SPDX-License-Identifier: GPL-3.0-only

//! [`storage_contracts::StorageDaemon`] on top of the UDisks2 system service

mod block;
mod job;
mod lvm;
mod mdraid;

use async_trait::async_trait;
use storage_contracts::{SnapshotSource, StorageError};
use storage_types::StorageSnapshot;
use zbus::Connection;
use zbus::zvariant::OwnedObjectPath;

use crate::DiskError;
use crate::snapshot::load_snapshot;
use crate::watcher::ChangeWatcher;

/// Client for the UDisks2 daemon on the system bus
#[derive(Clone)]
pub struct UDisksDaemon {
    connection: Connection,
}

impl UDisksDaemon {
    pub async fn new() -> Result<Self, DiskError> {
        let connection = Connection::system()
            .await
            .map_err(|e| DiskError::ConnectionFailed(e.to_string()))?;
        Ok(Self { connection })
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Get a reference to the D-Bus connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub async fn watch(&self) -> Result<ChangeWatcher, DiskError> {
        ChangeWatcher::subscribe(&self.connection).await
    }
}

#[async_trait]
impl SnapshotSource for UDisksDaemon {
    async fn snapshot(&self) -> Result<StorageSnapshot, StorageError> {
        Ok(load_snapshot(&self.connection).await?)
    }
}

pub(crate) fn object_path(path: &str) -> Result<OwnedObjectPath, DiskError> {
    OwnedObjectPath::try_from(path.to_string())
        .map_err(|e| DiskError::InvalidPath(format!("{path}: {e}")))
}
