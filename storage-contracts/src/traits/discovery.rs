// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use storage_types::StorageSnapshot;

use crate::StorageError;

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Read every exported object and its properties
    async fn snapshot(&self) -> Result<StorageSnapshot, StorageError>;
}
