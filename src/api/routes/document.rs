use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::domain::{EntryId, FieldPath, ListName, ResumeDocument};

#[derive(Debug, Deserialize)]
pub struct PatchFieldRequest {
    /// Dotted path, e.g. `personalInfo.name` or `education.<id>.degree`.
    pub path: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct EntryCreatedResponse {
    pub id: EntryId,
}

#[derive(Debug, Serialize)]
pub struct EntryRemovedResponse {
    pub removed: bool,
}

#[derive(Debug, Deserialize)]
pub struct FilePathRequest {
    pub path: PathBuf,
}

fn current(state: &AppState) -> Json<ResumeDocument> {
    Json(state.store.snapshot().as_ref().clone())
}

pub async fn get_document(State(state): State<AppState>) -> Json<ResumeDocument> {
    current(&state)
}

/// Replaces the whole document. The body is hydrated like a stored
/// document, so partial or malformed payloads are default-filled.
pub async fn replace_document(State(state): State<AppState>, body: String) -> Json<ResumeDocument> {
    let doc = state.store.load(&body);
    Json(doc.as_ref().clone())
}

pub async fn patch_field(
    State(state): State<AppState>,
    Json(request): Json<PatchFieldRequest>,
) -> ApiResult<Json<ResumeDocument>> {
    let path: FieldPath = request.path.parse()?;
    state.store.patch(&path, request.value)?;
    Ok(current(&state))
}

pub async fn add_entry(
    State(state): State<AppState>,
    Path(list): Path<String>,
) -> ApiResult<(StatusCode, Json<EntryCreatedResponse>)> {
    let list: ListName = list.parse()?;
    let id = state.store.add_entry(list);
    Ok((StatusCode::CREATED, Json(EntryCreatedResponse { id })))
}

pub async fn remove_entry(
    State(state): State<AppState>,
    Path((list, id)): Path<(String, String)>,
) -> ApiResult<Json<EntryRemovedResponse>> {
    let list: ListName = list.parse()?;
    let removed = state.store.remove_entry(list, &EntryId::from(id));
    Ok(Json(EntryRemovedResponse { removed }))
}

pub async fn save_as(
    State(state): State<AppState>,
    Json(request): Json<FilePathRequest>,
) -> ApiResult<StatusCode> {
    state.export.save_to_path(&request.path).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn open_file(
    State(state): State<AppState>,
    Json(request): Json<FilePathRequest>,
) -> ApiResult<Json<ResumeDocument>> {
    let doc = state.export.open_from_path(&request.path).await?;
    Ok(Json(doc.as_ref().clone()))
}

pub async fn render_export(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.export.render_export().await?;
    Ok(StatusCode::NO_CONTENT)
}
