mod fs;
mod in_memory;

pub(crate) use fs::write_atomic;
pub use fs::{FsDocumentPersistence, DOCUMENT_FILE};
pub use in_memory::InMemoryPersistence;
