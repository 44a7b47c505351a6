use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::domain::{ResumeDocument, VersionId, VersionInfo};

#[derive(Debug, Deserialize)]
pub struct CreateVersionRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct VersionCreatedResponse {
    pub id: VersionId,
}

pub async fn list_versions(State(state): State<AppState>) -> ApiResult<Json<Vec<VersionInfo>>> {
    Ok(Json(state.versions.list().await?))
}

/// Snapshots the live document under `name`.
pub async fn create_version(
    State(state): State<AppState>,
    Json(request): Json<CreateVersionRequest>,
) -> ApiResult<(StatusCode, Json<VersionCreatedResponse>)> {
    let id = state
        .versions
        .snapshot_current(&request.name, &state.store)
        .await?;
    Ok((StatusCode::CREATED, Json(VersionCreatedResponse { id })))
}

pub async fn get_version(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<ResumeDocument>> {
    Ok(Json(state.versions.load(VersionId(id)).await?))
}

pub async fn delete_version(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    state.versions.delete(VersionId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_version(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<ResumeDocument>> {
    let doc = state.versions.restore(VersionId(id), &state.store).await?;
    Ok(Json(doc.as_ref().clone()))
}
