use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::DomainError;

/// Durable storage for the autosave slot, plus explicit file import/export.
#[async_trait]
pub trait DocumentPersistence: Send + Sync {
    async fn load_document(&self) -> Result<String, DomainError>;
    async fn save_document(&self, serialized: &str) -> Result<(), DomainError>;
    async fn save_document_to_path(&self, path: &Path, serialized: &str)
        -> Result<(), DomainError>;
    async fn load_document_from_path(&self, path: &Path) -> Result<String, DomainError>;
}
