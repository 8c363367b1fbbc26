pub mod config;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod telemetry;
pub mod usecases;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use crate::config::Config;
use crate::models::registry::ContainerRegistry;
use crate::repositories::container_gateway::ContainerGateway;
use crate::repositories::docker_client::DockerClient;
use crate::repositories::render_sink::{RenderSink, TracingRenderSink};
use crate::usecases::container_actions::ContainerActions;
use crate::usecases::pending_actions::PendingActionTracker;
use crate::usecases::reconciler::{Reconciler, ReconcilerSettings};
use crate::usecases::status_cache::StatusCache;
use crate::usecases::status_poller::StatusPoller;

const CONFIG_PATH_ENV: &str = "DDC_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// The shared state behind the background loops: registry, cache and
/// pending tracker. Built once at startup and also handed to the external
/// command layer, so dispatched actions and the loops observe the same
/// data.
pub struct CoreState {
    pub registry: Arc<ContainerRegistry>,
    pub cache: Arc<StatusCache>,
    pub tracker: Arc<PendingActionTracker>,
    toggle_ttl: chrono::Duration,
}

impl CoreState {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: Arc::new(ContainerRegistry::new(config.containers.clone())),
            cache: Arc::new(StatusCache::new()),
            tracker: Arc::new(PendingActionTracker::new(chrono::Duration::seconds(
                config.pending.timeout_secs as i64,
            ))),
            toggle_ttl: chrono::Duration::seconds(config.cache.toggle_ttl_secs as i64),
        }
    }

    /// Command-layer entry point operating on this state.
    pub fn container_actions<G>(&self, gateway: Arc<G>) -> ContainerActions<G>
    where
        G: ContainerGateway + Send + Sync,
    {
        ContainerActions::new(
            gateway,
            Arc::clone(&self.tracker),
            Arc::clone(&self.cache),
            self.toggle_ttl,
        )
    }
}

pub async fn start() -> Result<()> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::from_file(&config_path)
        .with_context(|| format!("Loading configuration from {}", config_path))?;
    telemetry::init(&config.telemetry)?;

    let gateway = Arc::new(DockerClient::new()?);
    let sink = Arc::new(TracingRenderSink);
    let state = CoreState::new(&config);
    run_until_shutdown(config, state, gateway, sink).await
}

/// Composition root: runs the status poller plus one reconciliation loop
/// per channel against the given shared state until Ctrl-C.
pub async fn run_until_shutdown<G, S>(
    config: Config,
    state: CoreState,
    gateway: Arc<G>,
    sink: Arc<S>,
) -> Result<()>
where
    G: ContainerGateway + Send + Sync + 'static,
    S: RenderSink + Send + Sync + 'static,
{
    let CoreState {
        registry,
        cache,
        tracker,
        ..
    } = state;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = Vec::new();

    let poller = StatusPoller::new(
        Arc::clone(&gateway),
        Arc::clone(&cache),
        Arc::clone(&registry),
        std::time::Duration::from_secs(config.cache.refresh_interval_secs),
    );
    let poller_shutdown = shutdown_rx.clone();
    tasks.push(tokio::spawn(async move {
        poller.run(poller_shutdown).await;
    }));

    for channel in &config.channels {
        if !channel.enable_auto_refresh {
            info!(
                channel_id = channel.channel_id,
                "Auto-refresh disabled, not reconciling this channel"
            );
            continue;
        }

        let settings = ReconcilerSettings {
            channel_id: channel.channel_id,
            tick_interval: std::time::Duration::from_secs(
                channel.update_interval_secs(config.reconciler.tick_interval_secs),
            ),
            cache_ttl: chrono::Duration::seconds(config.cache.ttl_secs as i64),
        };
        let reconciler = Reconciler::new(
            Arc::clone(&gateway),
            Arc::clone(&sink),
            Arc::clone(&cache),
            Arc::clone(&tracker),
            Arc::clone(&registry),
            settings,
        );
        let reconciler_shutdown = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            reconciler.run(reconciler_shutdown).await;
        }));
    }

    info!(
        containers = config.containers.len(),
        channels = config.channels.len(),
        "ddc running"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping background loops");
    let _ = shutdown_tx.send(true);
    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}
