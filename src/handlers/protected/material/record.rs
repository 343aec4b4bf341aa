use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use crate::api::ApiJson;
use crate::api::format::{
    material_to_api_value, material_with_content_value, materials_to_api_values,
    materials_with_content_values,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{DeleteOutcome, RegisterMaterial};
use crate::state::AppState;

/// POST /api/materials - Register a file already uploaded to storage
///
/// Expected Input:
/// ```json
/// { "fileName": "notes.pdf", "storagePath": "user/notes.pdf", "fileType": "pdf" }
/// ```
pub async fn material_post(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(payload): ApiJson<RegisterMaterial>,
) -> ApiResult<Value> {
    let material = state.materials.register(&user, payload).await?;
    Ok(ApiResponse::created(material_to_api_value(&material)))
}

/// GET /api/materials - Caller's materials, newest first
pub async fn material_list(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> ApiResult<Vec<Value>> {
    let materials = state.materials.list(&user).await?;
    Ok(ApiResponse::success(materials_to_api_values(&materials)))
}

/// GET /api/materials/all-with-content - Each material with its generated content
pub async fn material_list_with_content(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> ApiResult<Vec<Value>> {
    let entries = state.materials.list_with_content(&user).await?;
    Ok(ApiResponse::success(materials_with_content_values(&entries)))
}

/// GET /api/materials/:id
pub async fn material_get(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let entry = state.materials.get(&user, &id).await?;
    Ok(ApiResponse::success(material_with_content_value(&entry)))
}

/// DELETE /api/materials/:id - Remove a material, its content and its blob
///
/// Repeating the call after a successful delete also returns 200.
pub async fn material_delete(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let message = match state.materials.delete(&user, &id).await? {
        DeleteOutcome::Deleted => "Material and all associated content deleted successfully.",
        DeleteOutcome::AlreadyGone => "Material not found, may have already been deleted.",
    };
    Ok(ApiResponse::success(json!({ "message": message })))
}
