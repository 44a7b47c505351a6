use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::domain::{ports::DocumentPersistence, DomainError};

pub const DOCUMENT_FILE: &str = "resume.json";

/// Autosave slot stored as a JSON file in the application data directory.
pub struct FsDocumentPersistence {
    data_dir: PathBuf,
}

impl FsDocumentPersistence {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_FILE)
    }
}

/// Writes through a sibling temp file so a crash never leaves a torn file.
pub(crate) async fn write_atomic(
    path: &Path,
    contents: impl AsRef<[u8]>,
) -> Result<(), DomainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DomainError::external(format!("Failed to create directory: {}", e)))?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)
        .await
        .map_err(|e| DomainError::external(format!("Failed to write to file: {}", e)))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| DomainError::external(format!("Failed to replace file: {}", e)))
}

#[async_trait]
impl DocumentPersistence for FsDocumentPersistence {
    async fn load_document(&self) -> Result<String, DomainError> {
        match fs::read_to_string(self.document_path()).await {
            Ok(contents) => Ok(contents),
            // First run: nothing saved yet.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok("{}".to_string()),
            Err(e) => Err(DomainError::external(format!("Failed to read file: {}", e))),
        }
    }

    async fn save_document(&self, serialized: &str) -> Result<(), DomainError> {
        write_atomic(&self.document_path(), serialized).await
    }

    async fn save_document_to_path(
        &self,
        path: &Path,
        serialized: &str,
    ) -> Result<(), DomainError> {
        write_atomic(path, serialized).await
    }

    async fn load_document_from_path(&self, path: &Path) -> Result<String, DomainError> {
        fs::read_to_string(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => DomainError::not_found(format!("no file at {}", path.display())),
            _ => DomainError::external(format!("Failed to read file: {}", e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_loads_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FsDocumentPersistence::new(dir.path().join("nested"));

        assert_eq!(persistence.load_document().await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FsDocumentPersistence::new(dir.path().join("app-data"));

        persistence
            .save_document(r#"{"personalInfo":{"name":"Ada"}}"#)
            .await
            .unwrap();

        assert_eq!(
            persistence.load_document().await.unwrap(),
            r#"{"personalInfo":{"name":"Ada"}}"#
        );
        assert!(!persistence.document_path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_load_from_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FsDocumentPersistence::new(dir.path());

        let err = persistence
            .load_document_from_path(&dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
