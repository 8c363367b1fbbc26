use async_trait::async_trait;
use mockall::automock;
use mockall::predicate::*;

use crate::config::ContainerConfig;
use crate::errors::docker::DockerQueryError;
use crate::models::container::ContainerStatus;

/// Narrow seam over the Docker daemon so the core can be driven by a fake
/// in tests. `query_status` distinguishes "container gone" (`NotFound`)
/// from transient daemon trouble.
#[automock]
#[async_trait]
pub trait ContainerGateway {
    async fn query_status(
        &self,
        container: &ContainerConfig,
    ) -> Result<ContainerStatus, DockerQueryError>;

    async fn start(&self, name: &str) -> Result<(), DockerQueryError>;
    async fn stop(&self, name: &str) -> Result<(), DockerQueryError>;
    async fn restart(&self, name: &str) -> Result<(), DockerQueryError>;
}
