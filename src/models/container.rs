use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Stable key identifying a managed container across the cache, the
/// pending tracker and the render sink. Assigned by configuration from
/// the docker name and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerIdentity(String);

impl ContainerIdentity {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerIdentity {
    fn from(value: &str) -> Self {
        ContainerIdentity::new(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMetrics {
    pub cpu_percent: f64,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
}

impl fmt::Display for ResourceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU {:.1}% / RAM {:.1}MiB",
            self.cpu_percent,
            self.memory_usage_bytes as f64 / (1024.0 * 1024.0)
        )
    }
}

/// Point-in-time container state as reported by the Docker query adapter.
/// `metrics` is absent when the container is stopped, when detailed status
/// is disabled for it, or when the stats query failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerStatus {
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub metrics: Option<ResourceMetrics>,
}

impl ContainerStatus {
    pub fn running() -> Self {
        Self {
            running: true,
            started_at: None,
            metrics: None,
        }
    }

    pub fn stopped() -> Self {
        Self {
            running: false,
            started_at: None,
            metrics: None,
        }
    }

    pub fn uptime(&self, now: DateTime<Utc>) -> Option<String> {
        self.started_at
            .filter(|_| self.running)
            .map(|started| format_uptime(now - started))
    }
}

/// Cache entry: last known state plus the moment it was observed.
/// `fetched_at` is monotonically non-decreasing per identity; the cache
/// rejects writes that would move it backwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedStatus {
    pub identity: ContainerIdentity,
    pub status: ContainerStatus,
    pub fetched_at: DateTime<Utc>,
}

impl CachedStatus {
    pub fn new(identity: ContainerIdentity, status: ContainerStatus, fetched_at: DateTime<Utc>) -> Self {
        Self {
            identity,
            status,
            fetched_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Start,
    Stop,
    Restart,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Start => "start",
            ActionKind::Stop => "stop",
            ActionKind::Restart => "restart",
        }
    }

    /// Whether an observed running state is evidence that this action has
    /// completed. A restart counts as resolved once the container is
    /// running again; no intermediate stopped state is required.
    pub fn resolves_with(&self, observed_running: bool) -> bool {
        match self {
            ActionKind::Start | ActionKind::Restart => observed_running,
            ActionKind::Stop => !observed_running,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-flight user action. At most one per identity; a newer action
/// overwrites the tracking entry of the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub identity: ContainerIdentity,
    pub action: ActionKind,
    pub issued_at: DateTime<Utc>,
}

/// What the render sink should show for a container.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayStatus {
    Online {
        metrics: Option<ResourceMetrics>,
        uptime: Option<String>,
    },
    Offline,
    /// Stale cache fallback: the adapter is unreachable, show the last
    /// observed running state instead of an error.
    LastSeen { running: bool },
    /// No observation at all.
    Unknown,
}

impl DisplayStatus {
    pub fn from_status(status: &ContainerStatus, now: DateTime<Utc>) -> Self {
        if status.running {
            DisplayStatus::Online {
                metrics: status.metrics.clone(),
                uptime: status.uptime(now),
            }
        } else {
            DisplayStatus::Offline
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayStatus::Online { metrics, uptime } => {
                f.write_str("Online")?;
                if let Some(uptime) = uptime {
                    write!(f, ", up {}", uptime)?;
                }
                if let Some(metrics) = metrics {
                    write!(f, ", {}", metrics)?;
                }
                Ok(())
            }
            DisplayStatus::Offline => f.write_str("Offline"),
            DisplayStatus::LastSeen { running: true } => f.write_str("Online (last seen)"),
            DisplayStatus::LastSeen { running: false } => f.write_str("Offline (last seen)"),
            DisplayStatus::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Instruction for the message edit sink. Ephemeral, never persisted.
/// `display_name` is the configured cosmetic name shown in the message.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub identity: ContainerIdentity,
    pub display_name: String,
    pub display_status: DisplayStatus,
    pub is_pending: bool,
}

/// Formats an uptime delta as `1d 2h 3m`, or `< 1m` for anything under a
/// minute.
pub fn format_uptime(delta: Duration) -> String {
    if delta < Duration::minutes(1) {
        return "< 1m".to_string();
    }

    let days = delta.num_days();
    let hours = delta.num_hours() % 24;
    let minutes = delta.num_minutes() % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.join(" ")
}
