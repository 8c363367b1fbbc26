use async_trait::async_trait;
use bollard::container::{
    InspectContainerOptions, RestartContainerOptions, StartContainerOptions, StatsOptions,
    StopContainerOptions,
};
use bollard::Docker;
use chrono::{DateTime, Datelike, Utc};
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::config::ContainerConfig;
use crate::errors::docker::DockerQueryError;
use crate::models::container::{ContainerStatus, ResourceMetrics};
use crate::repositories::container_gateway::ContainerGateway;

/// Grace period passed to stop and restart so containers get a chance to
/// shut down cleanly before the daemon kills them.
const STOP_GRACE_SECONDS: i64 = 30;

#[derive(Debug, Clone)]
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    pub fn new() -> Result<DockerClient, DockerQueryError> {
        debug!("Creating Docker client");
        let docker = Docker::connect_with_local_defaults().map_err(|e| {
            DockerQueryError::ConnectionFailed {
                reason: e.to_string(),
            }
        })?;
        Ok(Self { docker })
    }

    /// One-shot stats sample for a running container. Returns None when the
    /// daemon produced no sample; the status query degrades to metrics-less
    /// output in that case.
    async fn fetch_metrics(&self, name: &str) -> Result<Option<ResourceMetrics>, DockerQueryError> {
        let options = Some(StatsOptions {
            stream: false,
            one_shot: false,
        });

        let mut stream = self.docker.stats(name, options);
        let stats = match stream.next().await {
            Some(Ok(stats)) => stats,
            Some(Err(e)) => return Err(DockerQueryError::from_bollard(name, e)),
            None => return Ok(None),
        };

        let cpu_delta = stats
            .cpu_stats
            .cpu_usage
            .total_usage
            .saturating_sub(stats.precpu_stats.cpu_usage.total_usage) as f64;
        let system_delta = stats
            .cpu_stats
            .system_cpu_usage
            .unwrap_or(0)
            .saturating_sub(stats.precpu_stats.system_cpu_usage.unwrap_or(0))
            as f64;
        let online_cpus = stats.cpu_stats.online_cpus.unwrap_or(1) as f64;

        let cpu_percent = if system_delta > 0.0 {
            (cpu_delta / system_delta) * online_cpus * 100.0
        } else {
            0.0
        };

        Ok(Some(ResourceMetrics {
            cpu_percent,
            memory_usage_bytes: stats.memory_stats.usage.unwrap_or(0),
            memory_limit_bytes: stats.memory_stats.limit.unwrap_or(0),
        }))
    }
}

#[async_trait]
impl ContainerGateway for DockerClient {
    async fn query_status(
        &self,
        container: &ContainerConfig,
    ) -> Result<ContainerStatus, DockerQueryError> {
        let name = container.docker_name.as_str();
        let inspect = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .map_err(|e| DockerQueryError::from_bollard(name, e))?;

        let state = inspect.state.unwrap_or_default();
        let running = state.running.unwrap_or(false);
        let started_at = state
            .started_at
            .as_deref()
            .and_then(parse_docker_timestamp)
            .filter(|_| running);

        // Stats require an extra daemon round trip; only pay for it when the
        // container runs and detailed status is allowed. A failed stats
        // query still yields a usable running/uptime result.
        let metrics = if running && container.allow_detailed_status {
            match self.fetch_metrics(name).await {
                Ok(metrics) => metrics,
                Err(e) => {
                    warn!(container = name, error = %e, "Stats query failed, omitting metrics");
                    None
                }
            }
        } else {
            None
        };

        Ok(ContainerStatus {
            running,
            started_at,
            metrics,
        })
    }

    async fn start(&self, name: &str) -> Result<(), DockerQueryError> {
        debug!(container = name, "Starting container");
        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| action_error(name, "start", e))
    }

    async fn stop(&self, name: &str) -> Result<(), DockerQueryError> {
        debug!(container = name, "Stopping container");
        let options = Some(StopContainerOptions {
            t: STOP_GRACE_SECONDS,
        });
        self.docker
            .stop_container(name, options)
            .await
            .map_err(|e| action_error(name, "stop", e))
    }

    async fn restart(&self, name: &str) -> Result<(), DockerQueryError> {
        debug!(container = name, "Restarting container");
        let options = Some(RestartContainerOptions {
            t: STOP_GRACE_SECONDS as isize,
        });
        self.docker
            .restart_container(name, options)
            .await
            .map_err(|e| action_error(name, "restart", e))
    }
}

fn action_error(name: &str, action: &str, err: bollard::errors::Error) -> DockerQueryError {
    match err {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => DockerQueryError::NotFound {
            name: name.to_string(),
        },
        other => DockerQueryError::ActionFailed {
            name: name.to_string(),
            action: action.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Docker reports `StartedAt` as RFC 3339 with nanoseconds, and a
/// zero-value timestamp for containers that never started.
fn parse_docker_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
        .filter(|t| t.year() > 1)
}
