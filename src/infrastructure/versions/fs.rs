use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::{ports::VersionStore, DomainError, VersionId, VersionInfo, VersionSnapshot};
use crate::infrastructure::persistence::write_atomic;

pub const VERSIONS_FILE: &str = "versions.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionIndex {
    next_id: u64,
    versions: Vec<VersionSnapshot>,
}

impl VersionIndex {
    fn allocate_id(&mut self) -> VersionId {
        let floor = self.versions.iter().map(|v| v.id.0 + 1).max().unwrap_or(1);
        let id = self.next_id.max(floor);
        self.next_id = id + 1;
        VersionId(id)
    }
}

/// Snapshots kept in a single JSON index file, separate from the autosave slot.
pub struct FsVersionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the index file.
    lock: Mutex<()>,
}

impl FsVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_index(&self) -> Result<VersionIndex, DomainError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                DomainError::external(format!("corrupt version index {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(VersionIndex::default()),
            Err(e) => Err(DomainError::external(format!("Failed to read file: {}", e))),
        }
    }

    async fn write_index(&self, index: &VersionIndex) -> Result<(), DomainError> {
        let contents =
            serde_json::to_string_pretty(index).map_err(|e| DomainError::internal(e.to_string()))?;
        write_atomic(&self.path, &contents).await
    }
}

#[async_trait]
impl VersionStore for FsVersionStore {
    async fn list_versions(&self) -> Result<Vec<VersionInfo>, DomainError> {
        let _guard = self.lock.lock().await;
        let index = self.read_index().await?;
        Ok(index.versions.iter().map(VersionSnapshot::info).collect())
    }

    async fn create_version(&self, name: &str, serialized: &str) -> Result<VersionId, DomainError> {
        let _guard = self.lock.lock().await;
        let mut index = self.read_index().await?;

        let id = index.allocate_id();
        index.versions.push(VersionSnapshot {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
            serialized_document: serialized.to_string(),
        });
        self.write_index(&index).await?;
        Ok(id)
    }

    async fn load_version(&self, id: VersionId) -> Result<VersionSnapshot, DomainError> {
        let _guard = self.lock.lock().await;
        self.read_index()
            .await?
            .versions
            .into_iter()
            .find(|v| v.id == id)
            .ok_or_else(|| DomainError::not_found(format!("version {}", id)))
    }

    async fn delete_version(&self, id: VersionId) -> Result<(), DomainError> {
        let _guard = self.lock.lock().await;
        let mut index = self.read_index().await?;

        let before = index.versions.len();
        index.versions.retain(|v| v.id != id);
        if index.versions.len() == before {
            return Err(DomainError::not_found(format!("version {}", id)));
        }
        self.write_index(&index).await
    }
}
