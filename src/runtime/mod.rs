//! Access to the container engine.
//!
//! The monitor only needs two things from the engine: the state of every
//! container and the tail of a container's logs. Both live behind the
//! [`ContainerRuntime`] trait so the monitor can be driven by a fake in tests.

use std::time::Duration;

use async_trait::async_trait;

pub mod docker;
pub mod types;

pub use docker::DockerRuntime;
pub use types::{ContainerRecord, ContainerSnapshot, ContainerState};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeUnavailable {
    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),
    #[error("Container runtime did not answer within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List every container known to the engine. Stopped containers are only
    /// included when `include_stopped` is set.
    async fn list_all(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<ContainerRecord>, RuntimeUnavailable>;

    /// Combined stdout/stderr of the last `max_lines` lines of a container.
    async fn tail_logs(&self, name: &str, max_lines: usize) -> Result<String, RuntimeUnavailable>;
}
