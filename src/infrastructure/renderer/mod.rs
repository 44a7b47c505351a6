mod in_memory;
mod process;

pub use in_memory::InMemoryRenderer;
pub use process::{ProcessRenderer, EXPORT_FILE};
