use thiserror::Error;

/// Failures surfaced by the Docker query adapter.
///
/// `NotFound` is reported upward so the caller can deactivate the container
/// and prune its cache entry; everything else is transient and retried on
/// the next poll tick.
#[derive(Debug, Error)]
pub enum DockerQueryError {
    #[error("Container '{name}' not found")]
    NotFound { name: String },

    #[error("Docker query for '{name}' failed: {reason}")]
    Transient { name: String, reason: String },

    #[error("Failed to connect to Docker daemon: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Failed to {action} container '{name}': {reason}")]
    ActionFailed {
        name: String,
        action: String,
        reason: String,
    },
}

impl DockerQueryError {
    /// Maps a bollard error for `name` onto the adapter taxonomy. A 404
    /// from the daemon means the container no longer exists; everything
    /// else is treated as transient.
    pub fn from_bollard(name: &str, err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            } => DockerQueryError::NotFound {
                name: name.to_string(),
            },
            other => DockerQueryError::Transient {
                name: name.to_string(),
                reason: other.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DockerQueryError::NotFound { .. })
    }

    pub fn error_code(&self) -> &'static str {
        use crate::errors::codes::ErrorCode;

        match self {
            DockerQueryError::NotFound { .. } => ErrorCode::DOCKER_CONTAINER_NOT_FOUND,
            DockerQueryError::Transient { .. } => ErrorCode::DOCKER_QUERY_FAILED,
            DockerQueryError::ConnectionFailed { .. } => ErrorCode::DOCKER_CONNECTION_FAILED,
            DockerQueryError::ActionFailed { .. } => ErrorCode::DOCKER_ACTION_FAILED,
        }
    }
}
