use std::sync::Arc;

use crate::application::{
    ExportService, HandleRegistry, PreviewCache, ResumeStore, VersionRepository,
};
use crate::infrastructure::Config;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ResumeStore>,
    pub versions: Arc<VersionRepository>,
    pub preview: Arc<PreviewCache>,
    pub handles: HandleRegistry,
    pub export: Arc<ExportService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<ResumeStore>,
        versions: Arc<VersionRepository>,
        preview: Arc<PreviewCache>,
        handles: HandleRegistry,
        export: Arc<ExportService>,
        config: Config,
    ) -> Self {
        Self {
            store,
            versions,
            preview,
            handles,
            export,
            config: Arc::new(config),
        }
    }
}
