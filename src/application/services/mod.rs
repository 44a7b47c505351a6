mod debounce;
mod export;
mod handles;
mod persistence;
mod preview;
mod store;
mod versions;

pub use debounce::Debouncer;
pub use export::ExportService;
pub use handles::{HandleRegistry, PreviewHandle, DEFAULT_HANDLE_BASE};
pub use persistence::{
    PersistenceController, PersistenceEvent, PersistenceHandle, DEFAULT_DEBOUNCE,
};
pub use preview::{PreviewCache, RefreshOutcome};
pub use store::ResumeStore;
pub use versions::VersionRepository;
