use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::watch;
use tracing::instrument;
use uuid::Uuid;

use super::handles::{HandleRegistry, PreviewHandle};
use crate::domain::{
    ports::PreviewRenderer, DomainError, PreviewArtifact, PreviewStatus, RenderRequest,
    RenderTicket, ResumeDocument,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// This refresh's artifact is now the displayed preview.
    Displayed { uri: String },
    /// A newer refresh was issued before this one completed; its result
    /// was discarded.
    Superseded,
}

#[derive(Default)]
struct Slot {
    handle: Option<PreviewHandle>,
    torn_down: bool,
}

impl Slot {
    /// Installs `handle` and hands back the one it replaces, so the caller
    /// releases the old handle only once the new one is in place.
    fn install(&mut self, handle: PreviewHandle) -> Option<PreviewHandle> {
        self.handle.replace(handle)
    }

    fn current_uri(&self) -> Option<String> {
        self.handle.as_ref().map(|h| h.uri().to_string())
    }
}

/// Renders previews on demand and owns the single live display handle.
///
/// Every refresh takes a ticket from a monotonically increasing sequence.
/// Only the refresh holding the latest ticket may change what is displayed;
/// older completions are dropped, whether they succeeded or failed. A
/// failed refresh keeps the last good handle on display.
pub struct PreviewCache {
    renderer: Arc<dyn PreviewRenderer>,
    registry: HandleRegistry,
    mime_type: String,
    latest_ticket: AtomicU64,
    slot: Mutex<Slot>,
    status: watch::Sender<PreviewStatus>,
}

impl PreviewCache {
    pub fn new(
        renderer: Arc<dyn PreviewRenderer>,
        registry: HandleRegistry,
        mime_type: impl Into<String>,
    ) -> Self {
        let (status, _) = watch::channel(PreviewStatus::Empty);
        Self {
            renderer,
            registry,
            mime_type: mime_type.into(),
            latest_ticket: AtomicU64::new(0),
            slot: Mutex::new(Slot::default()),
            status,
        }
    }

    pub fn status(&self) -> PreviewStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewStatus> {
        self.status.subscribe()
    }

    /// Id of the handle currently on display.
    pub fn live_handle(&self) -> Option<Uuid> {
        self.lock_slot().handle.as_ref().map(PreviewHandle::id)
    }

    pub fn live_uri(&self) -> Option<String> {
        self.lock_slot().current_uri()
    }

    #[instrument(skip(self, document), fields(seq = tracing::field::Empty))]
    pub async fn refresh(&self, document: &ResumeDocument) -> Result<RefreshOutcome, DomainError> {
        let ticket = RenderTicket(self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1);
        tracing::Span::current().record("seq", ticket.0);

        {
            let slot = self.lock_slot();
            if slot.torn_down {
                return Err(DomainError::internal("preview cache has been torn down"));
            }
            self.status.send_replace(PreviewStatus::Loading {
                current: slot.current_uri(),
            });
        }

        let request = RenderRequest::from(document);
        let result = self.render_and_fetch(ticket, &request).await;

        let mut slot = self.lock_slot();
        if slot.torn_down || ticket.0 != self.latest_ticket.load(Ordering::SeqCst) {
            tracing::debug!(seq = ticket.0, "discarding stale preview response");
            return Ok(RefreshOutcome::Superseded);
        }

        match result {
            Ok(artifact) => {
                let bytes = artifact.len();
                let handle = self.registry.register(artifact);
                let uri = handle.uri().to_string();
                let previous = slot.install(handle);
                self.status
                    .send_replace(PreviewStatus::Ready { uri: uri.clone() });
                drop(slot);
                drop(previous);

                tracing::info!(seq = ticket.0, bytes, "preview ready");
                Ok(RefreshOutcome::Displayed { uri })
            }
            Err(e) => {
                self.status.send_replace(PreviewStatus::Failed {
                    error: e.to_string(),
                    last_good: slot.current_uri(),
                });
                tracing::warn!(seq = ticket.0, error = %e, "preview refresh failed");
                Err(e)
            }
        }
    }

    async fn render_and_fetch(
        &self,
        ticket: RenderTicket,
        request: &RenderRequest,
    ) -> Result<PreviewArtifact, DomainError> {
        self.renderer.render_preview(ticket, request).await?;
        let encoded = self.renderer.fetch_preview(ticket).await?;

        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DomainError::external(format!("preview payload is not valid base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(DomainError::external("renderer returned an empty preview"));
        }
        Ok(PreviewArtifact::new(bytes, self.mime_type.clone()))
    }

    /// Releases the live handle. Later refreshes fail and in-flight ones are
    /// discarded when they complete.
    pub fn teardown(&self) {
        let released = {
            let mut slot = self.lock_slot();
            slot.torn_down = true;
            slot.handle.take()
        };
        self.status.send_replace(PreviewStatus::Empty);

        if let Some(handle) = released {
            tracing::debug!(handle = %handle.id(), "releasing preview on teardown");
        }
    }

    // Slot updates are single assignments; a poisoned lock still holds a
    // consistent value.
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
