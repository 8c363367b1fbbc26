use std::sync::Arc;

use chrono::{Duration, Utc};

use ddc::config::{Config, ContainerConfig};
use ddc::models::container::{
    ActionKind, CachedStatus, ContainerIdentity, ContainerStatus, DisplayStatus,
};
use ddc::models::registry::ContainerRegistry;
use ddc::repositories::container_gateway::MockContainerGateway;
use ddc::repositories::render_sink::MockRenderSink;
use ddc::usecases::pending_actions::PendingActionTracker;
use ddc::usecases::reconciler::{Reconciler, ReconcilerSettings, TickOutcome};
use ddc::usecases::status_cache::StatusCache;
use ddc::usecases::status_poller::StatusPoller;
use ddc::CoreState;

const CHANNEL: u64 = 77;

fn settings() -> ReconcilerSettings {
    ReconcilerSettings {
        channel_id: CHANNEL,
        tick_interval: std::time::Duration::from_secs(60),
        cache_ttl: Duration::seconds(75),
    }
}

fn cached(name: &str, running: bool, fetched_at: chrono::DateTime<Utc>) -> CachedStatus {
    let status = if running {
        ContainerStatus::running()
    } else {
        ContainerStatus::stopped()
    };
    CachedStatus::new(ContainerIdentity::new(name), status, fetched_at)
}

/// A pending restart on a stopped container: observations made while the
/// container is still down keep suppressing renders; the first running
/// observation after the action resolves it and the next tick renders
/// online from the fresh cache entry.
#[tokio::test]
async fn pending_restart_resolves_on_the_first_running_observation() {
    let container = ContainerConfig::new("game-server");
    let identity = ContainerIdentity::new("game-server");

    let gateway = MockContainerGateway::new();
    let mut sink = MockRenderSink::new();
    sink.expect_render()
        .withf(|channel_id, request| {
            *channel_id == CHANNEL
                && matches!(request.display_status, DisplayStatus::Online { .. })
                && !request.is_pending
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let cache = Arc::new(StatusCache::new());
    let tracker = Arc::new(PendingActionTracker::new(Duration::seconds(120)));
    let registry = Arc::new(ContainerRegistry::new(vec![container.clone()]));
    let reconciler = Reconciler::new(
        Arc::new(gateway),
        Arc::new(sink),
        Arc::clone(&cache),
        Arc::clone(&tracker),
        Arc::clone(&registry),
        settings(),
    );

    let issued_at = Utc::now() - Duration::seconds(60);
    // Last fetch before the restart was issued: stopped.
    cache.insert(cached("game-server", false, issued_at - Duration::seconds(30)));
    tracker.mark_pending_at(identity.clone(), ActionKind::Restart, issued_at);

    // Tick while the only cached fetch predates the action: skip.
    assert_eq!(
        reconciler.process_container(&container).await,
        TickOutcome::SkippedPending
    );

    // Poller observes the container still down mid-restart: still skip.
    cache.insert(cached("game-server", false, issued_at + Duration::seconds(10)));
    assert_eq!(
        reconciler.process_container(&container).await,
        TickOutcome::SkippedPending
    );
    assert!(tracker.is_pending(&identity));

    // Poller observes the container back up: the action resolves and the
    // same tick renders online from the fresh entry.
    cache.insert(cached("game-server", true, issued_at + Duration::seconds(40)));
    assert_eq!(
        reconciler.process_container(&container).await,
        TickOutcome::Rendered
    );
    assert!(!tracker.is_pending(&identity));
}

/// Full pipeline: a dispatched restart suppresses rendering until the
/// poller refreshes the cache with a running observation.
#[tokio::test]
async fn dispatched_action_flows_through_poller_and_reconciler() {
    let container = ContainerConfig::new("game-server");
    let identity = ContainerIdentity::new("game-server");

    let mut gateway = MockContainerGateway::new();
    gateway
        .expect_restart()
        .withf(|name| name == "game-server")
        .times(1)
        .returning(|_| Ok(()));
    gateway
        .expect_query_status()
        .times(1)
        .returning(|_| Ok(ContainerStatus::running()));
    let gateway = Arc::new(gateway);

    let mut sink = MockRenderSink::new();
    sink.expect_render()
        .withf(|_, request| matches!(request.display_status, DisplayStatus::Online { .. }))
        .times(1)
        .returning(|_, _| Ok(()));

    // The command layer and both loops share one CoreState.
    let config = Config {
        containers: vec![container.clone()],
        channels: vec![],
        cache: Default::default(),
        reconciler: Default::default(),
        pending: Default::default(),
        telemetry: Default::default(),
    };
    let state = CoreState::new(&config);

    let actions = state.container_actions(Arc::clone(&gateway));
    let poller = StatusPoller::new(
        Arc::clone(&gateway),
        Arc::clone(&state.cache),
        Arc::clone(&state.registry),
        std::time::Duration::from_secs(30),
    );
    let reconciler = Reconciler::new(
        Arc::clone(&gateway),
        Arc::new(sink),
        Arc::clone(&state.cache),
        Arc::clone(&state.tracker),
        Arc::clone(&state.registry),
        settings(),
    );
    let tracker = Arc::clone(&state.tracker);

    actions
        .execute(&container, ActionKind::Restart)
        .await
        .unwrap();
    assert!(tracker.is_pending(&identity));

    // The command layer can show an immediate in-flight state.
    let pending = actions.pending_render(&container);
    assert!(pending.is_pending);

    // No post-action observation yet: the reconciler must not render.
    assert_eq!(
        reconciler.process_container(&container).await,
        TickOutcome::SkippedPending
    );

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    poller.poll_once().await;

    // The refreshed cache entry postdates the action and shows the
    // container running, so the restart resolves and renders.
    assert_eq!(
        reconciler.process_container(&container).await,
        TickOutcome::Rendered
    );
    assert!(!tracker.is_pending(&identity));
}
