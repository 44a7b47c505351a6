mod persistence;
mod renderer;
mod version_store;

pub use persistence::DocumentPersistence;
pub use renderer::PreviewRenderer;
pub use version_store::VersionStore;
