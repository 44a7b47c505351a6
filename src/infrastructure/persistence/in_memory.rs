use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ports::DocumentPersistence, DomainError};

/// Process-local persistence that records every call. Used as a test double
/// and for running without a data directory.
pub struct InMemoryPersistence {
    slot: RwLock<Option<String>>,
    files: RwLock<HashMap<PathBuf, String>>,
    saves: RwLock<Vec<String>>,
    load_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    latency: Duration,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            files: RwLock::new(HashMap::new()),
            saves: RwLock::new(Vec::new()),
            load_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fail_loads: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
            latency: Duration::ZERO,
        }
    }

    pub fn with_document(self, serialized: impl Into<String>) -> Self {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(serialized.into());
        self
    }

    /// Every save takes `latency` to complete.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Payloads of every successful save, oldest first.
    pub fn saves(&self) -> Vec<String> {
        self.saves.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn file(&self, path: &Path) -> Option<String> {
        self.files.read().ok().and_then(|f| f.get(path).cloned())
    }

    pub fn put_file(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), contents.into());
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentPersistence for InMemoryPersistence {
    async fn load_document(&self) -> Result<String, DomainError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(DomainError::external("document storage unavailable"));
        }

        let slot = self
            .slot
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(slot.clone().unwrap_or_else(|| "{}".to_string()))
    }

    async fn save_document(&self, serialized: &str) -> Result<(), DomainError> {
        let _guard = InFlight::enter(&self.in_flight, &self.max_in_flight);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DomainError::external("failed to write document"));
        }

        *self
            .slot
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))? = Some(serialized.to_string());
        self.saves
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .push(serialized.to_string());
        Ok(())
    }

    async fn save_document_to_path(
        &self,
        path: &Path,
        serialized: &str,
    ) -> Result<(), DomainError> {
        self.files
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .insert(path.to_path_buf(), serialized.to_string());
        Ok(())
    }

    async fn load_document_from_path(&self, path: &Path) -> Result<String, DomainError> {
        self.files
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .get(path)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("no file at {}", path.display())))
    }
}
