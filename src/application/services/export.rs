use std::path::Path;
use std::sync::Arc;

use tracing::instrument;

use super::store::ResumeStore;
use crate::domain::{
    ports::{DocumentPersistence, PreviewRenderer},
    DomainError, RenderRequest, ResumeDocument,
};

/// Explicit user-initiated outputs: the rendered export and "save as" /
/// "open" on arbitrary files. None of these touch the autosave slot.
pub struct ExportService {
    store: Arc<ResumeStore>,
    persistence: Arc<dyn DocumentPersistence>,
    renderer: Arc<dyn PreviewRenderer>,
}

impl ExportService {
    pub fn new(
        store: Arc<ResumeStore>,
        persistence: Arc<dyn DocumentPersistence>,
        renderer: Arc<dyn PreviewRenderer>,
    ) -> Self {
        Self {
            store,
            persistence,
            renderer,
        }
    }

    /// Renders the live document to the export format.
    #[instrument(skip(self))]
    pub async fn render_export(&self) -> Result<(), DomainError> {
        let request = RenderRequest::from(self.store.snapshot().as_ref());
        self.renderer.render_export(&request).await?;
        tracing::info!("export rendered");
        Ok(())
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn save_to_path(&self, path: &Path) -> Result<(), DomainError> {
        let serialized = self.store.snapshot().to_json()?;
        self.persistence
            .save_document_to_path(path, &serialized)
            .await?;
        tracing::info!(bytes = serialized.len(), "document saved to file");
        Ok(())
    }

    /// Reads a document file and makes it the live document. The file is
    /// hydrated like any other load, so partial files are accepted.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn open_from_path(&self, path: &Path) -> Result<Arc<ResumeDocument>, DomainError> {
        let raw = self.persistence.load_document_from_path(path).await?;
        let doc = self.store.load(&raw);
        tracing::info!("document opened from file");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldPath, PersonalField};
    use crate::infrastructure::{InMemoryPersistence, InMemoryRenderer};

    struct Fixture {
        store: Arc<ResumeStore>,
        persistence: Arc<InMemoryPersistence>,
        renderer: Arc<InMemoryRenderer>,
        service: ExportService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(ResumeStore::new());
        let persistence = Arc::new(InMemoryPersistence::new());
        let renderer = Arc::new(InMemoryRenderer::new());
        let service = ExportService::new(store.clone(), persistence.clone(), renderer.clone());
        Fixture {
            store,
            persistence,
            renderer,
            service,
        }
    }

    #[tokio::test]
    async fn test_render_export_sends_live_document() {
        let f = fixture();
        f.store
            .patch(&FieldPath::PersonalInfo(PersonalField::Name), "Ada")
            .unwrap();

        f.service.render_export().await.unwrap();

        let exports = f.renderer.exports();
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].personal_info.name, "Ada");
    }

    #[tokio::test]
    async fn test_render_export_failure_is_reported() {
        let f = fixture();
        f.renderer.set_fail(true);

        let err = f.service.render_export().await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }

    #[tokio::test]
    async fn test_save_and_open_round_trip_through_file() {
        let f = fixture();
        let path = Path::new("/tmp/cv.json");
        f.store
            .patch(&FieldPath::PersonalInfo(PersonalField::Email), "ada@example.com")
            .unwrap();

        f.service.save_to_path(path).await.unwrap();
        assert!(f.persistence.saves().is_empty());

        f.store.replace(ResumeDocument::default());
        let opened = f.service.open_from_path(path).await.unwrap();

        assert_eq!(opened.personal_info.email, "ada@example.com");
        assert_eq!(f.store.snapshot().personal_info.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_open_partial_file_default_fills() {
        let f = fixture();
        f.persistence
            .put_file("/tmp/old.json", r#"{"personalInfo":{"name":"Grace"}}"#);

        let opened = f.service.open_from_path(Path::new("/tmp/old.json")).await.unwrap();

        assert_eq!(opened.personal_info.name, "Grace");
        assert!(opened.skills.is_empty());
    }

    #[tokio::test]
    async fn test_open_missing_file_leaves_document_alone() {
        let f = fixture();
        f.store
            .patch(&FieldPath::PersonalInfo(PersonalField::Name), "Ada")
            .unwrap();

        let err = f
            .service
            .open_from_path(Path::new("/tmp/missing.json"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(f.store.snapshot().personal_info.name, "Ada");
    }
}
