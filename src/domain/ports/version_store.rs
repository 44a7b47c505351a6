use async_trait::async_trait;

use crate::domain::{errors::DomainError, VersionId, VersionInfo, VersionSnapshot};

#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn list_versions(&self) -> Result<Vec<VersionInfo>, DomainError>;
    async fn create_version(&self, name: &str, serialized: &str)
        -> Result<VersionId, DomainError>;
    /// Fails with `NotFound` for an unknown id.
    async fn load_version(&self, id: VersionId) -> Result<VersionSnapshot, DomainError>;
    /// Fails with `NotFound` for an unknown id.
    async fn delete_version(&self, id: VersionId) -> Result<(), DomainError>;
}
