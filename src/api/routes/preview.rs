use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::application::RefreshOutcome;
use crate::domain::{DomainError, PreviewStatus};

pub async fn preview_status(State(state): State<AppState>) -> Json<PreviewStatus> {
    Json(state.preview.status())
}

/// Renders the live document. A refresh overtaken by a newer one reports
/// the status as it stands, without an error.
pub async fn refresh_preview(State(state): State<AppState>) -> ApiResult<Json<PreviewStatus>> {
    let doc = state.store.snapshot();
    match state.preview.refresh(&doc).await? {
        RefreshOutcome::Displayed { uri } => Ok(Json(PreviewStatus::Ready { uri })),
        RefreshOutcome::Superseded => Ok(Json(state.preview.status())),
    }
}

/// Serves the bytes behind a live preview handle.
pub async fn serve_handle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let artifact = state
        .handles
        .resolve(id)
        .ok_or_else(|| DomainError::not_found(format!("preview handle {}", id)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, artifact.mime_type.clone())],
        Body::from(artifact.bytes.clone()),
    )
        .into_response())
}
