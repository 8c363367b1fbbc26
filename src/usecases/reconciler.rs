use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ContainerConfig;
use crate::errors::docker::DockerQueryError;
use crate::models::container::{CachedStatus, ContainerIdentity, DisplayStatus, RenderRequest};
use crate::models::registry::ContainerRegistry;
use crate::repositories::container_gateway::ContainerGateway;
use crate::repositories::render_sink::RenderSink;
use crate::usecases::pending_actions::PendingActionTracker;
use crate::usecases::status_cache::{CacheLookup, StatusCache};

/// Per-channel loop settings. `cache_ttl` is the base TTL for ordinary
/// reconciliation reads; reads older than that force a live query.
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    pub channel_id: u64,
    pub tick_interval: std::time::Duration,
    pub cache_ttl: chrono::Duration,
}

/// What happened to one container during one tick. Every container
/// produces exactly one outcome and at most one render request per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A pending action is still resolving; nothing was rendered.
    SkippedPending,
    Rendered,
    /// The container is gone from Docker and was deactivated.
    Deactivated,
    /// The render sink failed; other containers are unaffected.
    RenderFailed,
}

/// The consumer-facing loop: per tick and per tracked container, decides
/// whether to trust the cache, force a live refresh, or skip because a
/// pending action is still resolving, then emits one render request to
/// the message edit sink.
pub struct Reconciler<G, S> {
    gateway: Arc<G>,
    sink: Arc<S>,
    cache: Arc<StatusCache>,
    tracker: Arc<PendingActionTracker>,
    registry: Arc<ContainerRegistry>,
    settings: ReconcilerSettings,
}

impl<G, S> Reconciler<G, S>
where
    G: ContainerGateway + Send + Sync,
    S: RenderSink + Send + Sync,
{
    pub fn new(
        gateway: Arc<G>,
        sink: Arc<S>,
        cache: Arc<StatusCache>,
        tracker: Arc<PendingActionTracker>,
        registry: Arc<ContainerRegistry>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            gateway,
            sink,
            cache,
            tracker,
            registry,
            settings,
        }
    }

    /// Runs the tick loop until `shutdown` fires. Missed ticks are skipped
    /// rather than queued up.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            channel_id = self.settings.channel_id,
            interval_secs = self.settings.tick_interval.as_secs(),
            "Starting reconciliation loop"
        );
        let mut ticker = interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!(channel_id = self.settings.channel_id, "Reconciliation loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_tick().await;
                }
            }
        }
    }

    /// One pass over all active containers. Failures are contained per
    /// container; one broken render never aborts the rest of the tick.
    pub async fn run_tick(&self) {
        let containers = self.registry.active();
        let mut rendered = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;
        let mut deactivated = 0usize;

        for container in &containers {
            match self.process_container(container).await {
                TickOutcome::Rendered => rendered += 1,
                TickOutcome::SkippedPending => skipped += 1,
                TickOutcome::RenderFailed => failed += 1,
                TickOutcome::Deactivated => deactivated += 1,
            }
        }

        self.tracker.prune_expired();

        debug!(
            channel_id = self.settings.channel_id,
            rendered, skipped, failed, deactivated, "Reconciliation tick finished"
        );
    }

    pub async fn process_container(&self, container: &ContainerConfig) -> TickOutcome {
        let identity = container.identity();

        // A container mid-action is never overwritten with stale cached
        // status. The only early exit is a cache fetch newer than the
        // action's issue time whose running state resolves the action;
        // everything else waits for resolution or the pending timeout.
        if let Some(pending) = self.tracker.pending(&identity) {
            let resolved = match self.cache.peek(&identity) {
                Some(entry) if entry.fetched_at > pending.issued_at => {
                    self.tracker.try_resolve(&identity, entry.status.running)
                }
                _ => false,
            };
            if !resolved {
                debug!(
                    container = %identity,
                    action = %pending.action,
                    "Pending action unresolved, skipping render"
                );
                return TickOutcome::SkippedPending;
            }
        }

        let now = Utc::now();
        let display = match self.cache.get_at(&identity, self.settings.cache_ttl, now) {
            CacheLookup::Fresh(entry) => DisplayStatus::from_status(&entry.status, now),
            CacheLookup::Stale(entry) => match self.refresh_live(container, now).await {
                Ok(display) => display,
                Err(e) if e.is_not_found() => return self.deactivate(&identity),
                Err(e) => {
                    warn!(container = %identity, error = %e, "Live query failed, rendering last seen state");
                    DisplayStatus::LastSeen {
                        running: entry.status.running,
                    }
                }
            },
            CacheLookup::Miss => match self.refresh_live(container, now).await {
                Ok(display) => display,
                Err(e) if e.is_not_found() => return self.deactivate(&identity),
                Err(e) => {
                    warn!(container = %identity, error = %e, "Live query failed with no cached state");
                    DisplayStatus::Unknown
                }
            },
        };

        let request = RenderRequest {
            identity: identity.clone(),
            display_name: container.display_name().to_string(),
            display_status: display,
            is_pending: false,
        };
        match self.sink.render(self.settings.channel_id, request).await {
            Ok(()) => TickOutcome::Rendered,
            Err(e) => {
                warn!(
                    channel_id = self.settings.channel_id,
                    container = %identity,
                    error = %e,
                    "Render failed, continuing with remaining containers"
                );
                TickOutcome::RenderFailed
            }
        }
    }

    async fn refresh_live(
        &self,
        container: &ContainerConfig,
        now: DateTime<Utc>,
    ) -> Result<DisplayStatus, DockerQueryError> {
        let status = self.gateway.query_status(container).await?;
        self.cache
            .insert(CachedStatus::new(container.identity(), status.clone(), now));
        Ok(DisplayStatus::from_status(&status, now))
    }

    fn deactivate(&self, identity: &ContainerIdentity) -> TickOutcome {
        warn!(container = %identity, "Container not found, deactivating");
        self.registry.deactivate(identity);
        self.cache.invalidate(identity);
        TickOutcome::Deactivated
    }
}
