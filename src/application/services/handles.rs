use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::domain::PreviewArtifact;

pub const DEFAULT_HANDLE_BASE: &str = "preview://local";

/// Issues process-local handles for in-memory artifacts, so the UI can
/// address a preview by URI without the bytes being sent around again.
#[derive(Clone)]
pub struct HandleRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    base_uri: String,
    artifacts: RwLock<HashMap<Uuid, Arc<PreviewArtifact>>>,
}

impl HandleRegistry {
    /// Handle URIs are `<base_uri>/previews/<id>`.
    pub fn new(base_uri: impl Into<String>) -> Self {
        let base_uri = base_uri.into().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(RegistryInner {
                base_uri,
                artifacts: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn register(&self, artifact: PreviewArtifact) -> PreviewHandle {
        let id = Uuid::new_v4();
        let uri = format!("{}/previews/{}", self.inner.base_uri, id);

        self.inner
            .artifacts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(artifact));
        tracing::debug!(handle = %id, "preview handle created");

        PreviewHandle {
            id,
            uri,
            registry: self.clone(),
        }
    }

    pub fn resolve(&self, id: Uuid) -> Option<Arc<PreviewArtifact>> {
        self.inner
            .artifacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn live_count(&self) -> usize {
        self.inner
            .artifacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, id: Uuid) -> bool {
        self.inner
            .artifacts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLE_BASE)
    }
}

/// A live handle. Resolvable until dropped; dropping releases it.
pub struct PreviewHandle {
    id: Uuid,
    uri: String,
    registry: HandleRegistry,
}

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("id", &self.id)
            .field("uri", &self.uri)
            .finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if self.registry.release(self.id) {
            tracing::debug!(handle = %self.id, "preview handle released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_resolves_until_dropped() {
        let registry = HandleRegistry::new("http://127.0.0.1:8787/");
        let handle = registry.register(PreviewArtifact::new(b"%PDF".to_vec(), "application/pdf"));

        assert!(handle
            .uri()
            .starts_with("http://127.0.0.1:8787/previews/"));
        assert_eq!(registry.resolve(handle.id()).unwrap().bytes, b"%PDF");
        assert_eq!(registry.live_count(), 1);

        let id = handle.id();
        drop(handle);
        assert!(registry.resolve(id).is_none());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_handles_are_distinct() {
        let registry = HandleRegistry::default();
        let a = registry.register(PreviewArtifact::new(vec![1], "application/pdf"));
        let b = registry.register(PreviewArtifact::new(vec![2], "application/pdf"));

        assert_ne!(a.uri(), b.uri());
        assert_eq!(registry.live_count(), 2);
    }
}
