use std::sync::Arc;
use std::time::Duration;

use crate::runtime::{ContainerRuntime, ContainerSnapshot, RuntimeUnavailable};

/// Bounded, failure-tolerant view over [`ContainerRuntime::list_all`].
#[derive(Clone)]
pub struct ContainerInspector {
    runtime: Arc<dyn ContainerRuntime>,
    timeout: Duration,
}

impl ContainerInspector {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, timeout: Duration) -> Self {
        Self { runtime, timeout }
    }

    /// Lists every container, stopped ones included.
    pub async fn try_list_all(&self) -> Result<ContainerSnapshot, RuntimeUnavailable> {
        let records = tokio::time::timeout(self.timeout, self.runtime.list_all(true))
            .await
            .map_err(|_| RuntimeUnavailable::Timeout(self.timeout))??;

        Ok(records.into_iter().collect())
    }

    /// Like [`Self::try_list_all`] but an unreachable runtime yields an empty
    /// snapshot. An empty snapshot means "no data", not "no containers".
    pub async fn list_all(&self) -> ContainerSnapshot {
        match self.try_list_all().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("Unable to list containers: {e}");
                ContainerSnapshot::new()
            }
        }
    }
}
