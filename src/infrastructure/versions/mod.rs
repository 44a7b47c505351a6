mod fs;
mod in_memory;

pub use fs::{FsVersionStore, VERSIONS_FILE};
pub use in_memory::InMemoryVersionStore;
