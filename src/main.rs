use std::net::SocketAddr;
use std::sync::Arc;

use resume_sync::api::{create_router, AppState};
use resume_sync::application::{
    ExportService, HandleRegistry, PersistenceController, PreviewCache, ResumeStore,
    VersionRepository,
};
use resume_sync::infrastructure::{
    Config, FsDocumentPersistence, FsVersionStore, ProcessRenderer, VERSIONS_FILE,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resume_sync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let data_dir = config.storage.data_dir.clone();
    info!(data_dir = %data_dir.display(), "configuration loaded");

    let persistence = Arc::new(FsDocumentPersistence::new(&data_dir));
    let version_store = Arc::new(FsVersionStore::new(data_dir.join(VERSIONS_FILE)));
    let renderer = Arc::new(
        ProcessRenderer::new(&config.renderer.program, config.export_dir())
            .with_args(config.renderer.args.clone())
            .with_timeout(config.renderer_timeout()),
    );

    let store = Arc::new(ResumeStore::new());
    let autosave = PersistenceController::new(store.clone(), persistence.clone(), config.debounce())
        .start()
        .await;

    let handles = HandleRegistry::new(config.handle_base());
    let preview = Arc::new(PreviewCache::new(
        renderer.clone(),
        handles.clone(),
        config.preview.mime_type.clone(),
    ));
    let versions = Arc::new(VersionRepository::new(version_store));
    let export = Arc::new(ExportService::new(store.clone(), persistence, renderer));

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let state = AppState::new(store, versions, preview.clone(), handles, export, config);
    let app = create_router(state);

    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("shutting down");
    preview.teardown();
    autosave.shutdown().await;

    Ok(())
}
