use std::collections::HashMap;

use async_trait::async_trait;
use storage_contracts::{JobOpsAdapter, StorageError};
use tracing::info;

use super::{UDisksDaemon, object_path};
use crate::DiskError;
use crate::dbus::proxies::UDisks2JobProxy;

#[async_trait]
impl JobOpsAdapter for UDisksDaemon {
    async fn cancel_job(&self, job: &str) -> Result<(), StorageError> {
        let proxy = UDisks2JobProxy::builder(&self.connection)
            .path(object_path(job)?)
            .map_err(DiskError::from)?
            .build()
            .await
            .map_err(DiskError::from)?;
        proxy
            .cancel(HashMap::new())
            .await
            .map_err(|e| DiskError::from_call("Job.Cancel", e))?;
        info!(job, "cancelled job");
        Ok(())
    }
}
