// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use crate::StorageError;

#[async_trait]
pub trait JobOpsAdapter: Send + Sync {
    async fn cancel_job(&self, job: &str) -> Result<(), StorageError>;
}
