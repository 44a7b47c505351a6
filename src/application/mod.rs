//! Application layer - the live document and the components that keep it
//! in sync with storage, named versions and the rendered preview.
//!
//! Services depend on domain ports (traits) rather than concrete adapters.

pub mod services;

pub use services::{
    Debouncer, ExportService, HandleRegistry, PersistenceController, PersistenceEvent,
    PersistenceHandle, PreviewCache, PreviewHandle, RefreshOutcome, ResumeStore,
    VersionRepository,
};
