use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::models::container::{ActionKind, ContainerIdentity, PendingAction};

/// Records in-flight start/stop/restart actions so the reconciler can
/// suppress stale status renders until the action is observed to complete
/// or its timeout elapses.
///
/// At most one entry per identity: a new action overwrites the previous
/// one's tracking, it is never queued behind it. An entry older than the
/// timeout is abandoned without a verdict — `is_pending` simply turns
/// false and normal cache-driven rendering resumes.
#[derive(Debug)]
pub struct PendingActionTracker {
    entries: Mutex<HashMap<ContainerIdentity, PendingAction>>,
    timeout: Duration,
}

impl PendingActionTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Inserts or overwrites the entry for `identity` with the current time.
    pub fn mark_pending(&self, identity: ContainerIdentity, action: ActionKind) {
        self.mark_pending_at(identity, action, Utc::now());
    }

    /// Explicit-clock variant of [`mark_pending`](Self::mark_pending).
    pub fn mark_pending_at(
        &self,
        identity: ContainerIdentity,
        action: ActionKind,
        issued_at: DateTime<Utc>,
    ) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(previous) = entries.get(&identity) {
            debug!(
                container = %identity,
                previous = %previous.action,
                replacement = %action,
                "Replacing pending action"
            );
        }
        entries.insert(
            identity.clone(),
            PendingAction {
                identity,
                action,
                issued_at,
            },
        );
    }

    pub fn is_pending(&self, identity: &ContainerIdentity) -> bool {
        self.is_pending_at(identity, Utc::now())
    }

    pub fn is_pending_at(&self, identity: &ContainerIdentity, now: DateTime<Utc>) -> bool {
        self.pending_at(identity, now).is_some()
    }

    /// The active (unexpired) pending entry for `identity`, if any.
    pub fn pending(&self, identity: &ContainerIdentity) -> Option<PendingAction> {
        self.pending_at(identity, Utc::now())
    }

    pub fn pending_at(
        &self,
        identity: &ContainerIdentity,
        now: DateTime<Utc>,
    ) -> Option<PendingAction> {
        self.entries
            .lock()
            .unwrap()
            .get(identity)
            .filter(|entry| now - entry.issued_at < self.timeout)
            .cloned()
    }

    /// Action-aware completion check: clears the entry and returns true
    /// when the observed running state is what the tracked action was
    /// trying to reach. A restart counts as complete once the container
    /// runs again.
    pub fn try_resolve(&self, identity: &ContainerIdentity, observed_running: bool) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get(identity) else {
            return false;
        };

        if entry.action.resolves_with(observed_running) {
            info!(
                container = %identity,
                action = %entry.action,
                "Pending action resolved"
            );
            entries.remove(identity);
            true
        } else {
            false
        }
    }

    /// Drops entries older than the timeout. Expiry is lazy in the read
    /// path already; this keeps the map from accumulating abandoned
    /// entries for containers nobody renders anymore.
    pub fn prune_expired(&self) {
        self.prune_expired_at(Utc::now());
    }

    pub fn prune_expired_at(&self, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|identity, entry| {
            let keep = now - entry.issued_at < self.timeout;
            if !keep {
                info!(
                    container = %identity,
                    action = %entry.action,
                    "Pending action expired without a verdict"
                );
            }
            keep
        });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> PendingActionTracker {
        PendingActionTracker::new(Duration::seconds(120))
    }

    #[test]
    fn resolution_is_action_aware() {
        let t = tracker();
        let x = ContainerIdentity::new("x");

        t.mark_pending(x.clone(), ActionKind::Start);
        assert!(!t.try_resolve(&x, false));
        assert!(t.is_pending(&x));
        assert!(t.try_resolve(&x, true));
        assert!(!t.is_pending(&x));

        t.mark_pending(x.clone(), ActionKind::Stop);
        assert!(!t.try_resolve(&x, true));
        assert!(t.try_resolve(&x, false));

        t.mark_pending(x.clone(), ActionKind::Restart);
        assert!(!t.try_resolve(&x, false));
        assert!(t.try_resolve(&x, true));
    }

    #[test]
    fn a_new_action_overwrites_the_previous_one() {
        let t = tracker();
        let x = ContainerIdentity::new("x");

        t.mark_pending(x.clone(), ActionKind::Start);
        t.mark_pending(x.clone(), ActionKind::Stop);

        assert_eq!(t.len(), 1);
        assert_eq!(t.pending(&x).unwrap().action, ActionKind::Stop);
        // The overwritten start's resolution condition no longer applies.
        assert!(!t.try_resolve(&x, true));
        assert!(t.try_resolve(&x, false));
    }

    #[test]
    fn entries_expire_without_a_resolve_call() {
        let t = tracker();
        let x = ContainerIdentity::new("x");
        let issued = Utc::now();

        t.mark_pending_at(x.clone(), ActionKind::Start, issued);

        assert!(t.is_pending_at(&x, issued + Duration::seconds(119)));
        assert!(!t.is_pending_at(&x, issued + Duration::seconds(120)));
        assert!(!t.is_pending_at(&x, issued + Duration::seconds(500)));
    }

    #[test]
    fn prune_drops_only_expired_entries() {
        let t = tracker();
        let now = Utc::now();
        t.mark_pending_at(
            ContainerIdentity::new("old"),
            ActionKind::Stop,
            now - Duration::seconds(300),
        );
        t.mark_pending_at(ContainerIdentity::new("new"), ActionKind::Start, now);

        t.prune_expired_at(now);

        assert_eq!(t.len(), 1);
        assert!(t.is_pending_at(&ContainerIdentity::new("new"), now));
    }

    #[test]
    fn resolving_an_unknown_identity_is_a_noop() {
        let t = tracker();
        assert!(!t.try_resolve(&ContainerIdentity::new("missing"), true));
    }
}
