use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::domain::{ports::PreviewRenderer, DomainError, RenderRequest, RenderTicket};

/// Renderer stand-in whose "artifact" is the request JSON itself.
pub struct InMemoryRenderer {
    rendered: RwLock<HashMap<RenderTicket, Vec<u8>>>,
    exports: RwLock<Vec<RenderRequest>>,
    fail: AtomicBool,
}

impl InMemoryRenderer {
    pub fn new() -> Self {
        Self {
            rendered: RwLock::new(HashMap::new()),
            exports: RwLock::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn exports(&self) -> Vec<RenderRequest> {
        self.exports.read().map(|e| e.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::external("renderer unavailable"));
        }
        Ok(())
    }
}

impl Default for InMemoryRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreviewRenderer for InMemoryRenderer {
    async fn render_preview(
        &self,
        ticket: RenderTicket,
        request: &RenderRequest,
    ) -> Result<(), DomainError> {
        self.check()?;
        let bytes =
            serde_json::to_vec(request).map_err(|e| DomainError::internal(e.to_string()))?;
        self.rendered
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .insert(ticket, bytes);
        Ok(())
    }

    async fn fetch_preview(&self, ticket: RenderTicket) -> Result<String, DomainError> {
        self.check()?;
        let bytes = self
            .rendered
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .remove(&ticket)
            .ok_or_else(|| {
                DomainError::external(format!("no rendered preview for request {}", ticket.0))
            })?;
        Ok(STANDARD.encode(bytes))
    }

    async fn render_export(&self, request: &RenderRequest) -> Result<(), DomainError> {
        self.check()?;
        self.exports
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .push(request.clone());
        Ok(())
    }
}
