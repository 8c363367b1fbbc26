use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};
use thiserror::Error;

use crate::errors::codes::ErrorCode;
use crate::models::container::ContainerIdentity;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Io(_) => ErrorCode::CONFIG_READ_FAILED,
            ConfigError::Yaml(_) => ErrorCode::CONFIG_PARSE_FAILED,
        }
    }
}

/// One managed container. `docker_name` is the stable identity used across
/// the cache, the pending tracker and the render sink; `display_name` is
/// cosmetic and defaults to the docker name.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    pub docker_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_true")]
    pub allow_detailed_status: bool,
}

impl ContainerConfig {
    pub fn new(docker_name: &str) -> Self {
        Self {
            docker_name: docker_name.to_string(),
            display_name: None,
            allow_detailed_status: true,
        }
    }

    pub fn identity(&self) -> ContainerIdentity {
        ContainerIdentity::new(&self.docker_name)
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.docker_name)
    }
}

/// A Discord channel carrying tracked status messages. Each channel runs
/// its own reconciliation tick, optionally on its own interval.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub channel_id: u64,
    #[serde(default)]
    pub update_interval_secs: Option<u64>,
    #[serde(default = "default_true")]
    pub enable_auto_refresh: bool,
}

impl ChannelConfig {
    pub fn update_interval_secs(&self, default_secs: u64) -> u64 {
        self.update_interval_secs.unwrap_or(default_secs)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Background poll interval for the status cache.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Base TTL for reconciliation reads.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Extended TTL for UI-only reads (expand/collapse toggles).
    #[serde(default = "default_toggle_ttl_secs")]
    pub toggle_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            ttl_secs: default_ttl_secs(),
            toggle_ttl_secs: default_toggle_ttl_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Default tick interval for channels without an override.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PendingConfig {
    /// Age at which an unresolved pending action is abandoned.
    #[serde(default = "default_pending_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_pending_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub excluded_modules: Vec<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: default_service_name(),
            otlp_endpoint: default_otlp_endpoint(),
            log_level: default_log_level(),
            excluded_modules: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub containers: Vec<ContainerConfig>,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub pending: PendingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file: File = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval_secs() -> u64 {
    30
}

fn default_ttl_secs() -> u64 {
    75
}

fn default_toggle_ttl_secs() -> u64 {
    150
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_pending_timeout_secs() -> u64 {
    120
}

fn default_service_name() -> String {
    "ddc".to_string()
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn given_valid_yaml_when_loaded_then_config_is_parsed_correctly() {
        let yaml = r#"
containers:
  - docker_name: game-server
    display_name: Game Server
  - docker_name: plex
    allow_detailed_status: false
channels:
  - channel_id: 123456789
    update_interval_secs: 120
  - channel_id: 987654321
"#;
        let mut tmpfile = NamedTempFile::new().unwrap();
        write!(tmpfile, "{}", yaml).unwrap();

        let config = Config::from_file(tmpfile.path());

        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.containers.len(), 2);
        assert_eq!(config.containers[0].docker_name, "game-server");
        assert_eq!(config.containers[0].display_name(), "Game Server");
        assert!(config.containers[0].allow_detailed_status);
        assert_eq!(config.containers[1].display_name(), "plex");
        assert!(!config.containers[1].allow_detailed_status);
        assert_eq!(config.channels[0].update_interval_secs(60), 120);
        assert_eq!(config.channels[1].update_interval_secs(60), 60);
        assert!(config.channels[1].enable_auto_refresh);
    }

    #[test]
    fn given_no_tunables_when_loaded_then_defaults_apply() {
        let yaml = r#"
containers:
  - docker_name: valheim
"#;
        let mut tmpfile = NamedTempFile::new().unwrap();
        write!(tmpfile, "{}", yaml).unwrap();

        let config = Config::from_file(tmpfile.path()).unwrap();

        assert_eq!(config.cache.refresh_interval_secs, 30);
        assert_eq!(config.cache.ttl_secs, 75);
        assert_eq!(config.cache.toggle_ttl_secs, 150);
        assert_eq!(config.reconciler.tick_interval_secs, 60);
        assert_eq!(config.pending.timeout_secs, 120);
        assert!(!config.telemetry.enabled);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn given_invalid_yaml_when_loaded_then_returns_error() {
        let yaml = "not: valid: yaml";
        let mut tmpfile = NamedTempFile::new().unwrap();
        write!(tmpfile, "{}", yaml).unwrap();

        let config = Config::from_file(tmpfile.path());

        assert!(config.is_err());
    }
}
