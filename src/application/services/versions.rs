use std::sync::Arc;

use tracing::instrument;

use super::store::ResumeStore;
use crate::domain::{
    ports::VersionStore, sort_newest_first, validate_version_name, DomainError, ResumeDocument,
    VersionId, VersionInfo,
};

/// Named snapshots of the serialized document, independent of the autosave
/// slot. Holds no parsed document of its own.
pub struct VersionRepository {
    store: Arc<dyn VersionStore>,
}

impl VersionRepository {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    /// Snapshot metadata, most recent first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<VersionInfo>, DomainError> {
        let mut versions = self.store.list_versions().await?;
        sort_newest_first(&mut versions);
        Ok(versions)
    }

    /// Rejects blank names before touching the store.
    #[instrument(skip(self, serialized), fields(bytes = serialized.len()))]
    pub async fn create(&self, name: &str, serialized: &str) -> Result<VersionId, DomainError> {
        let name = validate_version_name(name)?;
        let id = self.store.create_version(&name, serialized).await?;
        tracing::info!(version_id = %id, name = %name, "version created");
        Ok(id)
    }

    /// Fetches a snapshot and hydrates it the same way as a startup load.
    #[instrument(skip(self))]
    pub async fn load(&self, id: VersionId) -> Result<ResumeDocument, DomainError> {
        let snapshot = self.store.load_version(id).await?;
        Ok(ResumeDocument::hydrate(&snapshot.serialized_document))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: VersionId) -> Result<(), DomainError> {
        self.store.delete_version(id).await?;
        tracing::info!(version_id = %id, "version deleted");
        Ok(())
    }

    /// Creates a version from the live document.
    pub async fn snapshot_current(
        &self,
        name: &str,
        documents: &ResumeStore,
    ) -> Result<VersionId, DomainError> {
        let serialized = documents.snapshot().to_json()?;
        self.create(name, &serialized).await
    }

    /// Replaces the live document with a stored version. Autosave sees this
    /// as an ordinary edit.
    pub async fn restore(
        &self,
        id: VersionId,
        documents: &ResumeStore,
    ) -> Result<Arc<ResumeDocument>, DomainError> {
        let doc = self.load(id).await?;
        documents.replace(doc);
        tracing::info!(version_id = %id, "version restored");
        Ok(documents.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldPath, PersonalField, VersionSnapshot};
    use crate::infrastructure::InMemoryVersionStore;
    use chrono::Utc;

    fn repository() -> (Arc<InMemoryVersionStore>, VersionRepository) {
        let store = Arc::new(InMemoryVersionStore::new());
        (store.clone(), VersionRepository::new(store))
    }

    #[tokio::test]
    async fn test_blank_names_rejected_without_store_call() {
        let (store, repo) = repository();

        for name in ["", "   "] {
            let err = repo.create(name, "{}").await.unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(store.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_without_bodies() {
        let (_, repo) = repository();
        repo.create("v1", "{}").await.unwrap();
        repo.create("v2", "{}").await.unwrap();

        let names: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["v2", "v1"]);
    }

    #[tokio::test]
    async fn test_load_default_fills_legacy_payload() {
        let (store, repo) = repository();
        store.insert(VersionSnapshot {
            id: VersionId(3),
            name: "legacy".to_string(),
            created_at: Utc::now(),
            serialized_document: r#"{"personalInfo":{"name":"Ada","phone":"555"}}"#.to_string(),
        });

        let doc = repo.load(VersionId(3)).await.unwrap();
        assert_eq!(doc.personal_info.name, "Ada");
        assert_eq!(doc.personal_info.github, "");
        assert!(doc.work_experience.is_empty());
    }

    #[tokio::test]
    async fn test_load_and_delete_unknown_fail() {
        let (_, repo) = repository();

        assert!(matches!(
            repo.load(VersionId(42)).await.unwrap_err(),
            DomainError::NotFound(_)
        ));
        assert!(matches!(
            repo.delete(VersionId(42)).await.unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_from_list() {
        let (_, repo) = repository();
        let keep = repo.create("keep", "{}").await.unwrap();
        let discarded = repo.create("discard", "{}").await.unwrap();

        repo.delete(discarded).await.unwrap();

        let ids: Vec<_> = repo.list().await.unwrap().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![keep]);
    }

    #[tokio::test]
    async fn test_snapshot_and_restore_replace_live_document() {
        let (_, repo) = repository();
        let documents = ResumeStore::new();
        let name = FieldPath::PersonalInfo(PersonalField::Name);

        documents.patch(&name, "Ada").unwrap();
        let id = repo.snapshot_current("  first draft ", &documents).await.unwrap();
        assert_eq!(repo.list().await.unwrap()[0].name, "first draft");

        documents.patch(&name, "Grace").unwrap();
        let rx = documents.subscribe();
        let restored = repo.restore(id, &documents).await.unwrap();

        assert_eq!(restored.personal_info.name, "Ada");
        assert_eq!(documents.snapshot().personal_info.name, "Ada");
        assert!(rx.has_changed().unwrap());
    }
}
