pub mod config;
pub mod persistence;
pub mod renderer;
pub mod versions;

pub use config::Config;
pub use persistence::{FsDocumentPersistence, InMemoryPersistence, DOCUMENT_FILE};
pub use renderer::{InMemoryRenderer, ProcessRenderer, EXPORT_FILE};
pub use versions::{FsVersionStore, InMemoryVersionStore, VERSIONS_FILE};
