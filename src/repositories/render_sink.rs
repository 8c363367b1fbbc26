use async_trait::async_trait;
use mockall::automock;
use mockall::predicate::*;
use tracing::info;

use crate::errors::render::RenderError;
use crate::models::container::RenderRequest;

/// Sink that applies a render request to the previously posted status
/// message for a container in a channel. The Discord edit layer plugs in
/// here; failures are reported back so the reconciler can isolate them.
#[automock]
#[async_trait]
pub trait RenderSink {
    async fn render(&self, channel_id: u64, request: RenderRequest) -> Result<(), RenderError>;
}

/// Default sink: logs render requests instead of editing messages. Used
/// when no message-edit integration is wired in.
#[derive(Debug, Clone, Default)]
pub struct TracingRenderSink;

#[async_trait]
impl RenderSink for TracingRenderSink {
    async fn render(&self, channel_id: u64, request: RenderRequest) -> Result<(), RenderError> {
        info!(
            channel_id,
            container = %request.identity,
            name = %request.display_name,
            status = %request.display_status,
            pending = request.is_pending,
            "Render"
        );
        Ok(())
    }
}
