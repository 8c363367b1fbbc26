use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::ContainerConfig;
use crate::errors::docker::DockerQueryError;
use crate::models::container::{
    ActionKind, CachedStatus, DisplayStatus, RenderRequest,
};
use crate::repositories::container_gateway::ContainerGateway;
use crate::usecases::pending_actions::PendingActionTracker;
use crate::usecases::status_cache::{CacheLookup, StatusCache};

/// Entry point for the command layer: dispatches a user-initiated action
/// to Docker and tracks it as pending, and serves the ad-hoc status reads
/// the UI toggle path needs outside the reconciliation tick.
pub struct ContainerActions<G> {
    gateway: Arc<G>,
    tracker: Arc<PendingActionTracker>,
    cache: Arc<StatusCache>,
    /// Extended TTL for UI-only reads, so an expand/collapse toggle does
    /// not trigger needless adapter calls.
    toggle_ttl: chrono::Duration,
}

impl<G> ContainerActions<G>
where
    G: ContainerGateway + Send + Sync,
{
    pub fn new(
        gateway: Arc<G>,
        tracker: Arc<PendingActionTracker>,
        cache: Arc<StatusCache>,
        toggle_ttl: chrono::Duration,
    ) -> Self {
        Self {
            gateway,
            tracker,
            cache,
            toggle_ttl,
        }
    }

    /// Dispatches `action` to Docker and, on success, marks it pending so
    /// the reconciler stops rendering stale status for this container
    /// until the action resolves. A failed dispatch tracks nothing.
    pub async fn execute(
        &self,
        container: &ContainerConfig,
        action: ActionKind,
    ) -> Result<(), DockerQueryError> {
        let name = container.docker_name.as_str();
        match action {
            ActionKind::Start => self.gateway.start(name).await?,
            ActionKind::Stop => self.gateway.stop(name).await?,
            ActionKind::Restart => self.gateway.restart(name).await?,
        }

        self.tracker.mark_pending(container.identity(), action);
        info!(container = name, action = %action, "Action dispatched, tracked as pending");
        Ok(())
    }

    /// The immediate "action in flight" render the command layer shows
    /// right after dispatch, carrying the last observed state if any.
    pub fn pending_render(&self, container: &ContainerConfig) -> RenderRequest {
        let identity = container.identity();
        let display_status = match self.cache.peek(&identity) {
            Some(entry) => DisplayStatus::LastSeen {
                running: entry.status.running,
            },
            None => DisplayStatus::Unknown,
        };
        RenderRequest {
            identity,
            display_name: container.display_name().to_string(),
            display_status,
            is_pending: true,
        }
    }

    /// Ad-hoc status read for the UI toggle path. Uses the extended TTL
    /// and only falls back to a live query when even that is exceeded.
    pub async fn status_for_toggle(&self, container: &ContainerConfig) -> RenderRequest {
        let identity = container.identity();
        if self.tracker.is_pending(&identity) {
            return self.pending_render(container);
        }

        let now = Utc::now();
        let display_status = match self.cache.get_at(&identity, self.toggle_ttl, now) {
            CacheLookup::Fresh(entry) => DisplayStatus::from_status(&entry.status, now),
            CacheLookup::Stale(entry) => match self.gateway.query_status(container).await {
                Ok(status) => {
                    self.cache
                        .insert(CachedStatus::new(identity.clone(), status.clone(), now));
                    DisplayStatus::from_status(&status, now)
                }
                Err(e) => {
                    warn!(container = %identity, error = %e, "Toggle query failed, using last seen state");
                    DisplayStatus::LastSeen {
                        running: entry.status.running,
                    }
                }
            },
            CacheLookup::Miss => match self.gateway.query_status(container).await {
                Ok(status) => {
                    self.cache
                        .insert(CachedStatus::new(identity.clone(), status.clone(), now));
                    DisplayStatus::from_status(&status, now)
                }
                Err(e) => {
                    warn!(container = %identity, error = %e, "Toggle query failed with no cached state");
                    DisplayStatus::Unknown
                }
            },
        };

        RenderRequest {
            identity,
            display_name: container.display_name().to_string(),
            display_status,
            is_pending: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::models::container::{ContainerIdentity, ContainerStatus};
    use crate::repositories::container_gateway::MockContainerGateway;

    fn actions(gateway: MockContainerGateway) -> ContainerActions<MockContainerGateway> {
        ContainerActions::new(
            Arc::new(gateway),
            Arc::new(PendingActionTracker::new(Duration::seconds(120))),
            Arc::new(StatusCache::new()),
            Duration::seconds(150),
        )
    }

    #[tokio::test]
    async fn successful_dispatch_marks_the_action_pending() {
        let mut gateway = MockContainerGateway::new();
        gateway
            .expect_start()
            .withf(|name| name == "game-server")
            .times(1)
            .returning(|_| Ok(()));

        let actions = actions(gateway);
        let container = ContainerConfig::new("game-server");

        actions.execute(&container, ActionKind::Start).await.unwrap();

        let pending = actions
            .tracker
            .pending(&ContainerIdentity::new("game-server"))
            .unwrap();
        assert_eq!(pending.action, ActionKind::Start);
    }

    #[tokio::test]
    async fn failed_dispatch_tracks_nothing() {
        let mut gateway = MockContainerGateway::new();
        gateway.expect_stop().times(1).returning(|name| {
            Err(DockerQueryError::ActionFailed {
                name: name.to_string(),
                action: "stop".to_string(),
                reason: "daemon unavailable".to_string(),
            })
        });

        let actions = actions(gateway);
        let container = ContainerConfig::new("game-server");

        let result = actions.execute(&container, ActionKind::Stop).await;

        assert!(result.is_err());
        assert!(!actions
            .tracker
            .is_pending(&ContainerIdentity::new("game-server")));
    }

    #[tokio::test]
    async fn toggle_reads_use_the_extended_ttl() {
        let mut gateway = MockContainerGateway::new();
        gateway.expect_query_status().never();

        let actions = actions(gateway);
        let container = ContainerConfig::new("game-server");
        // 100s old: stale for the base 75s TTL, still fresh for the 150s
        // toggle TTL.
        actions.cache.insert(CachedStatus::new(
            container.identity(),
            ContainerStatus::running(),
            Utc::now() - Duration::seconds(100),
        ));

        let request = actions.status_for_toggle(&container).await;

        assert!(matches!(
            request.display_status,
            DisplayStatus::Online { .. }
        ));
        assert!(!request.is_pending);
    }

    #[tokio::test]
    async fn toggle_on_a_pending_container_reports_pending() {
        let mut gateway = MockContainerGateway::new();
        gateway.expect_query_status().never();

        let actions = actions(gateway);
        let container = ContainerConfig::new("game-server");
        actions.cache.insert(CachedStatus::new(
            container.identity(),
            ContainerStatus::stopped(),
            Utc::now(),
        ));
        actions
            .tracker
            .mark_pending(container.identity(), ActionKind::Start);

        let request = actions.status_for_toggle(&container).await;

        assert!(request.is_pending);
        assert_eq!(
            request.display_status,
            DisplayStatus::LastSeen { running: false }
        );
    }
}
