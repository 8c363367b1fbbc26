pub mod codes;
pub mod docker;
pub mod render;

use thiserror::Error;

use crate::config::ConfigError;
use crate::errors::docker::DockerQueryError;
use crate::errors::render::RenderError;

pub type DdcResult<T> = Result<T, DdcError>;

pub trait HasErrorCode {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, Error)]
pub enum DdcError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Docker(#[from] DockerQueryError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HasErrorCode for DdcError {
    fn error_code(&self) -> &'static str {
        match self {
            DdcError::Config(e) => e.error_code(),
            DdcError::Docker(e) => e.error_code(),
            DdcError::Render(e) => e.error_code(),
            DdcError::Internal(_) => "E000",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::codes::ErrorCode;

    #[test]
    fn error_codes_pass_through_the_top_level_error() {
        let not_found = DdcError::Docker(DockerQueryError::NotFound {
            name: "game-server".to_string(),
        });
        assert_eq!(not_found.error_code(), ErrorCode::DOCKER_CONTAINER_NOT_FOUND);

        let gone = DdcError::Render(RenderError::MessageGone {
            identity: "game-server".to_string(),
            reason: "deleted".to_string(),
        });
        assert_eq!(gone.error_code(), ErrorCode::RENDER_MESSAGE_GONE);

        let internal = DdcError::Internal(anyhow::anyhow!("boom"));
        assert_eq!(internal.error_code(), "E000");
    }

    #[test]
    fn not_found_mapping_keys_off_http_404() {
        let err = DockerQueryError::from_bollard(
            "game-server",
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message: "no such container".to_string(),
            },
        );
        assert!(err.is_not_found());

        let err = DockerQueryError::from_bollard(
            "game-server",
            bollard::errors::Error::DockerResponseServerError {
                status_code: 500,
                message: "daemon error".to_string(),
            },
        );
        assert!(!err.is_not_found());
    }
}
