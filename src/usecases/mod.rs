pub mod container_actions;
pub mod pending_actions;
pub mod reconciler;
pub mod status_cache;
pub mod status_poller;
