use std::sync::Mutex;

use tracing::info;

use crate::config::ContainerConfig;
use crate::models::container::ContainerIdentity;

/// The active set of managed containers. Configuration owns the initial
/// set; a container observed as gone from Docker is deactivated here so
/// the poller and the reconcilers stop touching it.
#[derive(Debug)]
pub struct ContainerRegistry {
    containers: Mutex<Vec<ContainerConfig>>,
}

impl ContainerRegistry {
    pub fn new(containers: Vec<ContainerConfig>) -> Self {
        Self {
            containers: Mutex::new(containers),
        }
    }

    /// Snapshot of the currently active container configurations.
    pub fn active(&self) -> Vec<ContainerConfig> {
        self.containers.lock().unwrap().clone()
    }

    pub fn is_active(&self, identity: &ContainerIdentity) -> bool {
        self.containers
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.docker_name == identity.as_str())
    }

    /// Removes `identity` from the active set. Returns true if it was
    /// present.
    pub fn deactivate(&self, identity: &ContainerIdentity) -> bool {
        let mut containers = self.containers.lock().unwrap();
        let before = containers.len();
        containers.retain(|c| c.docker_name != identity.as_str());
        let removed = containers.len() < before;
        if removed {
            info!(container = %identity, "Deactivated container, no longer polled");
        }
        removed
    }
}
