use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::instrument;

use super::debounce::Debouncer;
use super::store::ResumeStore;
use crate::domain::{ports::DocumentPersistence, ResumeDocument};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

const EVENT_CAPACITY: usize = 32;

/// Outcome notifications for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceEvent {
    Loaded,
    LoadFailed(String),
    Saved,
    SaveFailed(String),
}

/// Keeps the durable copy eventually consistent with the live document.
///
/// Edits are debounced: only the state present after a quiet period of
/// `debounce` is saved. At most one save is in flight at a time; a settle
/// that happens during a save is saved after it completes. Failed saves are
/// reported, never retried; the next edit's cycle saves again.
pub struct PersistenceController {
    store: Arc<ResumeStore>,
    persistence: Arc<dyn DocumentPersistence>,
    debounce: Duration,
    events: broadcast::Sender<PersistenceEvent>,
}

impl PersistenceController {
    pub fn new(
        store: Arc<ResumeStore>,
        persistence: Arc<dyn DocumentPersistence>,
        debounce: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            persistence,
            debounce,
            events,
        }
    }

    pub fn with_default_debounce(
        store: Arc<ResumeStore>,
        persistence: Arc<dyn DocumentPersistence>,
    ) -> Self {
        Self::new(store, persistence, DEFAULT_DEBOUNCE)
    }

    pub fn events(&self) -> broadcast::Receiver<PersistenceEvent> {
        self.events.subscribe()
    }

    /// Loads the stored document into the store, then starts autosaving.
    /// The hydrated state itself is not saved back.
    #[instrument(skip(self), fields(debounce_ms = self.debounce.as_millis() as u64))]
    pub async fn start(self) -> PersistenceHandle {
        self.hydrate().await;

        let changes = self.store.subscribe();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let events = self.events.clone();
        let task = tokio::spawn(self.run(changes, shutdown_rx));

        PersistenceHandle {
            events,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn hydrate(&self) {
        match self.persistence.load_document().await {
            Ok(raw) => {
                self.store.load(&raw);
                tracing::info!(bytes = raw.len(), "document loaded");
                let _ = self.events.send(PersistenceEvent::Loaded);
            }
            Err(e) => {
                tracing::warn!(error = %e, "initial load failed, starting with empty document");
                self.store.replace(ResumeDocument::default());
                let _ = self.events.send(PersistenceEvent::LoadFailed(e.to_string()));
            }
        }
    }

    async fn run(
        self,
        mut changes: watch::Receiver<Arc<ResumeDocument>>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut debouncer = Debouncer::new(self.debounce);
        let mut store_alive = true;

        loop {
            tokio::select! {
                changed = changes.changed(), if store_alive => {
                    match changed {
                        Ok(()) => debouncer.schedule(),
                        Err(_) => store_alive = false,
                    }
                }
                _ = debouncer.fired() => {
                    let doc = changes.borrow_and_update().clone();
                    store_alive = self
                        .save_tracking_edits(&doc, &mut changes, &mut debouncer, store_alive)
                        .await;
                }
                // Fires on explicit shutdown and when the handle is dropped.
                _ = &mut shutdown => break,
            }

            if !store_alive && !debouncer.is_pending() {
                break;
            }
        }

        let unseen = changes.has_changed().unwrap_or(false);
        if debouncer.cancel() || unseen {
            let doc = changes.borrow_and_update().clone();
            self.save(&doc).await;
        }
        tracing::debug!("autosave stopped");
    }

    /// Runs one save to completion while still re-arming the debouncer for
    /// edits that arrive meanwhile, so their quiet period overlaps the save.
    async fn save_tracking_edits(
        &self,
        doc: &ResumeDocument,
        changes: &mut watch::Receiver<Arc<ResumeDocument>>,
        debouncer: &mut Debouncer,
        mut store_alive: bool,
    ) -> bool {
        let save = self.save(doc);
        tokio::pin!(save);

        loop {
            tokio::select! {
                _ = &mut save => return store_alive,
                changed = changes.changed(), if store_alive => {
                    match changed {
                        Ok(()) => debouncer.schedule(),
                        Err(_) => store_alive = false,
                    }
                }
            }
        }
    }

    async fn save(&self, doc: &ResumeDocument) {
        let serialized = match doc.to_json() {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize document");
                let _ = self.events.send(PersistenceEvent::SaveFailed(e.to_string()));
                return;
            }
        };

        match self.persistence.save_document(&serialized).await {
            Ok(()) => {
                tracing::debug!(bytes = serialized.len(), "document saved");
                let _ = self.events.send(PersistenceEvent::Saved);
            }
            Err(e) => {
                tracing::error!(error = %e, "autosave failed");
                let _ = self.events.send(PersistenceEvent::SaveFailed(e.to_string()));
            }
        }
    }
}

/// Running autosave loop. Dropping the handle stops the loop the same way
/// `shutdown` does.
pub struct PersistenceHandle {
    events: broadcast::Sender<PersistenceEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PersistenceHandle {
    pub fn events(&self) -> broadcast::Receiver<PersistenceEvent> {
        self.events.subscribe()
    }

    /// Saves any edit still inside its quiet period, then stops.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::error!(error = %e, "autosave task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldPath, PersonalField};
    use crate::infrastructure::InMemoryPersistence;
    use tokio::time::sleep;

    const NAME: FieldPath = FieldPath::PersonalInfo(PersonalField::Name);

    async fn start(
        persistence: Arc<InMemoryPersistence>,
    ) -> (Arc<ResumeStore>, PersistenceHandle) {
        let store = Arc::new(ResumeStore::new());
        let handle = PersistenceController::with_default_debounce(store.clone(), persistence)
            .start()
            .await;
        (store, handle)
    }

    fn saved_docs(persistence: &InMemoryPersistence) -> Vec<ResumeDocument> {
        persistence
            .saves()
            .iter()
            .map(|raw| ResumeDocument::hydrate(raw))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_edit_saved_after_quiet_period() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let (store, _handle) = start(persistence.clone()).await;

        store.patch(&NAME, "Ada").unwrap();
        sleep(Duration::from_millis(999)).await;
        assert!(persistence.saves().is_empty());

        sleep(Duration::from_millis(50)).await;
        let saved = saved_docs(&persistence);
        assert_eq!(saved.len(), 1);

        let mut expected = ResumeDocument::default();
        expected.personal_info.name = "Ada".to_string();
        assert_eq!(saved[0], expected);
        assert_eq!(persistence.load_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_saves_once_with_final_value() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let (store, _handle) = start(persistence.clone()).await;

        for value in ["A", "Ad", "Ada", "Ada ", "Ada L"] {
            store.patch(&NAME, value).unwrap();
            sleep(Duration::from_millis(300)).await;
        }
        sleep(Duration::from_millis(2000)).await;

        let saved = saved_docs(&persistence);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].personal_info.name, "Ada L");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydration_is_not_saved_back() {
        let persistence = Arc::new(
            InMemoryPersistence::new().with_document(r#"{"personalInfo":{"name":"Grace"}}"#),
        );
        let (store, _handle) = start(persistence.clone()).await;

        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.snapshot().personal_info.name, "Grace");
        assert!(persistence.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_starts_empty() {
        let persistence = Arc::new(
            InMemoryPersistence::new().with_document(r#"{"personalInfo":{"name":"Grace"}}"#),
        );
        persistence.set_fail_loads(true);
        let store = Arc::new(ResumeStore::new());
        let controller = PersistenceController::with_default_debounce(store.clone(), persistence.clone());
        let mut events = controller.events();

        let _handle = controller.start().await;

        assert_eq!(*store.snapshot(), ResumeDocument::default());
        assert!(matches!(events.recv().await.unwrap(), PersistenceEvent::LoadFailed(_)));
        assert_eq!(persistence.load_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_never_overlap() {
        let persistence =
            Arc::new(InMemoryPersistence::new().with_latency(Duration::from_millis(3000)));
        let (store, _handle) = start(persistence.clone()).await;

        store.patch(&NAME, "first").unwrap();
        // First save starts at 1000ms and runs until 4000ms.
        sleep(Duration::from_millis(1500)).await;
        store.patch(&NAME, "second").unwrap();
        // Second settle at 2500ms, while the first save is still running.
        sleep(Duration::from_millis(1500)).await;
        assert!(persistence.saves().is_empty());

        sleep(Duration::from_millis(10_000)).await;
        let saved = saved_docs(&persistence);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].personal_info.name, "first");
        assert_eq!(saved[1].personal_info.name, "second");
        assert_eq!(persistence.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_failure_reported_and_next_edit_retries() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let (store, handle) = start(persistence.clone()).await;
        let mut events = handle.events();
        persistence.set_fail_saves(true);

        store.patch(&NAME, "Ada").unwrap();
        sleep(Duration::from_millis(1100)).await;

        assert!(matches!(events.recv().await.unwrap(), PersistenceEvent::SaveFailed(_)));
        assert_eq!(store.snapshot().personal_info.name, "Ada");
        sleep(Duration::from_secs(10)).await;
        assert!(persistence.saves().is_empty());

        persistence.set_fail_saves(false);
        store.patch(&NAME, "Ada L").unwrap();
        sleep(Duration::from_millis(1100)).await;

        assert_eq!(events.recv().await.unwrap(), PersistenceEvent::Saved);
        assert_eq!(saved_docs(&persistence)[0].personal_info.name, "Ada L");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_edit() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let (store, handle) = start(persistence.clone()).await;

        store.patch(&NAME, "Ada").unwrap();
        sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        let saved = saved_docs(&persistence);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].personal_info.name, "Ada");
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_rearms_debounce() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let (store, _handle) = start(persistence.clone()).await;

        store.load(r#"{"skills":[{"id":"s1","categoryName":"Languages"}]}"#);
        sleep(Duration::from_millis(1100)).await;

        let saved = saved_docs(&persistence);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].skills[0].category_name, "Languages");
    }
}
