pub mod document;
pub mod health;
pub mod preview;
pub mod versions;

use axum::http::{header, Method};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::middleware::logging::request_logger;
use crate::api::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/previews/{id}", get(preview::serve_handle))
        .nest("/api/v1", api_v1_routes())
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/document",
            get(document::get_document)
                .put(document::replace_document)
                .patch(document::patch_field),
        )
        .route("/document/save-as", post(document::save_as))
        .route("/document/open", post(document::open_file))
        .route("/document/{list}/entries", post(document::add_entry))
        .route(
            "/document/{list}/entries/{id}",
            axum::routing::delete(document::remove_entry),
        )
        .route("/export", post(document::render_export))
        .route(
            "/versions",
            get(versions::list_versions).post(versions::create_version),
        )
        .route(
            "/versions/{id}",
            get(versions::get_version).delete(versions::delete_version),
        )
        .route("/versions/{id}/restore", post(versions::restore_version))
        .route("/preview", get(preview::preview_status))
        .route("/preview/refresh", post(preview::refresh_preview))
}
