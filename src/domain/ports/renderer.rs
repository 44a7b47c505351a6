use async_trait::async_trait;

use crate::domain::{errors::DomainError, RenderRequest, RenderTicket};

/// External renderer. Previews take two round trips: `render_preview`
/// produces the artifact on the renderer's side, `fetch_preview` retrieves
/// it base64-encoded. Both phases of one refresh carry the same ticket.
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render_preview(
        &self,
        ticket: RenderTicket,
        request: &RenderRequest,
    ) -> Result<(), DomainError>;
    async fn fetch_preview(&self, ticket: RenderTicket) -> Result<String, DomainError>;
    /// Renders to the persistent export format.
    async fn render_export(&self, request: &RenderRequest) -> Result<(), DomainError>;
}
