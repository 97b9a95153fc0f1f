//! Docker client module using bollard.

use async_trait::async_trait;
use bollard::Docker;
use bollard::models::ContainerSummary;
use bollard::query_parameters::{
    ListContainersOptions, ListContainersOptionsBuilder, LogsOptions, LogsOptionsBuilder,
};
use futures_util::StreamExt;

use super::{ContainerRecord, ContainerRuntime, ContainerState, RuntimeUnavailable};

#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects using the default connection method
    /// (Unix socket on Linux/macOS, named pipe on Windows).
    pub fn connect() -> Result<Self, RuntimeUnavailable> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }
}

/// Turns a bollard summary into a record. Containers without any usable
/// identifier are dropped.
fn record_from_summary(summary: ContainerSummary) -> Option<ContainerRecord> {
    // Docker prefixes names with a slash ("/web")
    let name = summary
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|name| name.trim_start_matches('/').to_string())
        .filter(|name| !name.is_empty())
        .or(summary.id)?;

    let state = summary
        .state
        .map(|state| ContainerState::from_runtime(&state.to_string()))
        .unwrap_or(ContainerState::Unknown);

    let status = summary.status.unwrap_or_else(|| "unknown".to_string());

    Some(ContainerRecord {
        name,
        state,
        status,
    })
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_all(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<ContainerRecord>, RuntimeUnavailable> {
        let options: ListContainersOptions =
            ListContainersOptionsBuilder::new().all(include_stopped).build();

        let containers = self.docker.list_containers(Some(options)).await?;

        Ok(containers
            .into_iter()
            .filter_map(record_from_summary)
            .collect())
    }

    async fn tail_logs(&self, name: &str, max_lines: usize) -> Result<String, RuntimeUnavailable> {
        let options: LogsOptions = LogsOptionsBuilder::new()
            .stdout(true)
            .stderr(true)
            .follow(false)
            .tail(&max_lines.to_string())
            .build();

        let mut stream = self.docker.logs(name, Some(options));
        let mut logs = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.inspect_err(|e| {
                log::warn!("Failed reading logs of container {name}: {e}");
            })?;
            logs.push_str(&chunk.to_string());
        }

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(names: Option<Vec<&str>>, id: Option<&str>, status: Option<&str>) -> ContainerSummary {
        ContainerSummary {
            id: id.map(String::from),
            names: names.map(|n| n.into_iter().map(String::from).collect()),
            status: status.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_record_strips_leading_slash() {
        let record = record_from_summary(summary(Some(vec!["/web"]), Some("abc"), Some("Up 2 hours")))
            .expect("record");
        assert_eq!(record.name, "web");
        assert_eq!(record.status, "Up 2 hours");
        // No state reported at all
        assert_eq!(record.state, ContainerState::Unknown);
    }

    #[test]
    fn test_record_falls_back_to_id() {
        let record = record_from_summary(summary(None, Some("abc123"), None)).expect("record");
        assert_eq!(record.name, "abc123");
        assert_eq!(record.status, "unknown");
    }

    #[test]
    fn test_record_without_identifier_is_dropped() {
        assert!(record_from_summary(summary(Some(vec![]), None, None)).is_none());
    }
}
