use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{ports::VersionStore, DomainError, VersionId, VersionInfo, VersionSnapshot};

pub struct InMemoryVersionStore {
    versions: RwLock<Vec<VersionSnapshot>>,
    next_id: RwLock<u64>,
    create_calls: AtomicUsize,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self {
            versions: RwLock::new(Vec::new()),
            next_id: RwLock::new(1),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Inserts a snapshot as-is, e.g. one written by an older release.
    pub fn insert(&self, snapshot: VersionSnapshot) {
        if let Ok(mut next_id) = self.next_id.write() {
            *next_id = (*next_id).max(snapshot.id.0 + 1);
        }
        if let Ok(mut versions) = self.versions.write() {
            versions.push(snapshot);
        }
    }
}

impl Default for InMemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn list_versions(&self) -> Result<Vec<VersionInfo>, DomainError> {
        let versions = self
            .versions
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(versions.iter().map(VersionSnapshot::info).collect())
    }

    async fn create_version(&self, name: &str, serialized: &str) -> Result<VersionId, DomainError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let mut next_id = self
            .next_id
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let id = VersionId(*next_id);
        *next_id += 1;

        self.versions
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .push(VersionSnapshot {
                id,
                name: name.to_string(),
                created_at: Utc::now(),
                serialized_document: serialized.to_string(),
            });
        Ok(id)
    }

    async fn load_version(&self, id: VersionId) -> Result<VersionSnapshot, DomainError> {
        self.versions
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("version {}", id)))
    }

    async fn delete_version(&self, id: VersionId) -> Result<(), DomainError> {
        let mut versions = self
            .versions
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let before = versions.len();
        versions.retain(|v| v.id != id);
        if versions.len() == before {
            return Err(DomainError::not_found(format!("version {}", id)));
        }
        Ok(())
    }
}
