use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::models::registry::ContainerRegistry;
use crate::repositories::container_gateway::ContainerGateway;
use crate::usecases::status_cache::StatusCache;

/// Background poller: refreshes the status cache for every active
/// container on a fixed interval and deactivates containers Docker no
/// longer knows about.
pub struct StatusPoller<G> {
    gateway: Arc<G>,
    cache: Arc<StatusCache>,
    registry: Arc<ContainerRegistry>,
    refresh_interval: std::time::Duration,
}

impl<G> StatusPoller<G>
where
    G: ContainerGateway + Send + Sync,
{
    pub fn new(
        gateway: Arc<G>,
        cache: Arc<StatusCache>,
        registry: Arc<ContainerRegistry>,
        refresh_interval: std::time::Duration,
    ) -> Self {
        Self {
            gateway,
            cache,
            registry,
            refresh_interval,
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.refresh_interval.as_secs(),
            "Starting status poll loop"
        );
        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Status poll loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }

    pub async fn poll_once(&self) {
        let containers = self.registry.active();
        if containers.is_empty() {
            debug!("No active containers, skipping status refresh");
            return;
        }

        let not_found = self.cache.refresh_all(self.gateway.as_ref(), &containers).await;
        for identity in not_found {
            self.registry.deactivate(&identity);
            self.cache.invalidate(&identity);
        }
    }
}
