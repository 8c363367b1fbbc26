use thiserror::Error;

/// Failures from the message edit sink. Both variants are isolated per
/// identity by the reconciler; they never abort a tick.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Status message for '{identity}' is gone: {reason}")]
    MessageGone { identity: String, reason: String },

    #[error("Failed to edit status message for '{identity}': {reason}")]
    EditFailed { identity: String, reason: String },
}

impl RenderError {
    pub fn error_code(&self) -> &'static str {
        use crate::errors::codes::ErrorCode;

        match self {
            RenderError::MessageGone { .. } => ErrorCode::RENDER_MESSAGE_GONE,
            RenderError::EditFailed { .. } => ErrorCode::RENDER_EDIT_FAILED,
        }
    }
}
