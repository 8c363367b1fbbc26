use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::config::ContainerConfig;
use crate::models::container::{CachedStatus, ContainerIdentity};
use crate::repositories::container_gateway::ContainerGateway;

/// Result of a TTL-bounded cache read. `Stale` still carries the entry so
/// callers can degrade to last-seen rendering when a live query fails.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(CachedStatus),
    Stale(CachedStatus),
    Miss,
}

/// Last known state per container, written by the background poller and
/// read concurrently by the reconcilers and ad-hoc UI lookups. A single
/// mutex guards the map; refresh-in-progress and read-in-progress at the
/// same time is the normal case.
#[derive(Debug, Default)]
pub struct StatusCache {
    entries: Mutex<HashMap<ContainerIdentity, CachedStatus>>,
    last_errors: Mutex<HashMap<ContainerIdentity, String>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL-bounded read against the current time.
    pub fn get(&self, identity: &ContainerIdentity, max_age: Duration) -> CacheLookup {
        self.get_at(identity, max_age, Utc::now())
    }

    /// TTL-bounded read against an explicit clock.
    pub fn get_at(
        &self,
        identity: &ContainerIdentity,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> CacheLookup {
        match self.entries.lock().unwrap().get(identity) {
            Some(entry) if now - entry.fetched_at <= max_age => CacheLookup::Fresh(entry.clone()),
            Some(entry) => CacheLookup::Stale(entry.clone()),
            None => CacheLookup::Miss,
        }
    }

    /// The raw entry regardless of age. The reconciler uses this to check
    /// whether a fetch newer than a pending action's issue time exists.
    pub fn peek(&self, identity: &ContainerIdentity) -> Option<CachedStatus> {
        self.entries.lock().unwrap().get(identity).cloned()
    }

    /// Writes an entry unless a newer fetch is already present; `fetched_at`
    /// never moves backwards for an identity. Returns whether the write
    /// took effect.
    pub fn insert(&self, entry: CachedStatus) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&entry.identity) {
            Some(existing) if existing.fetched_at > entry.fetched_at => {
                debug!(
                    container = %entry.identity,
                    "Discarding cache write older than the stored entry"
                );
                false
            }
            _ => {
                entries.insert(entry.identity.clone(), entry);
                true
            }
        }
    }

    /// Drops the entry so the next read reports a miss. Used when a
    /// NotFound observation should also discard the stale data.
    pub fn invalidate(&self, identity: &ContainerIdentity) {
        self.entries.lock().unwrap().remove(identity);
        self.last_errors.lock().unwrap().remove(identity);
    }

    /// Queries live state for every given container and stores the results.
    /// Adapter failures keep the previous entry; NotFound identities are
    /// returned to the caller for deactivation. Repeated identical errors
    /// are logged once per distinct error text per identity.
    pub async fn refresh_all<G>(
        &self,
        gateway: &G,
        containers: &[ContainerConfig],
    ) -> Vec<ContainerIdentity>
    where
        G: ContainerGateway + Sync + ?Sized,
    {
        let mut not_found = Vec::new();
        let mut refreshed = 0usize;
        let mut failed = 0usize;

        for container in containers {
            let identity = container.identity();
            match gateway.query_status(container).await {
                Ok(status) => {
                    self.insert(CachedStatus::new(identity.clone(), status, Utc::now()));
                    self.last_errors.lock().unwrap().remove(&identity);
                    refreshed += 1;
                }
                Err(e) if e.is_not_found() => {
                    warn!(container = %identity, "Container not found during refresh");
                    not_found.push(identity);
                }
                Err(e) => {
                    self.log_throttled(&identity, &e.to_string());
                    failed += 1;
                }
            }
        }

        debug!(refreshed, failed, "Status cache refresh finished");
        not_found
    }

    /// Returns whether the failure was logged at warn level. A repeat of
    /// the last recorded error text for this identity is demoted to debug.
    fn log_throttled(&self, identity: &ContainerIdentity, error: &str) -> bool {
        let mut last_errors = self.last_errors.lock().unwrap();
        match last_errors.get(identity) {
            Some(previous) if previous == error => {
                debug!(container = %identity, error, "Status refresh failed (repeat)");
                false
            }
            _ => {
                warn!(container = %identity, error, "Status refresh failed, keeping stale entry");
                last_errors.insert(identity.clone(), error.to_string());
                true
            }
        }
    }
}
