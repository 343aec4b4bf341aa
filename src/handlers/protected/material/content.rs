use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use crate::api::format::contents_to_api_values;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/materials/:id/content - All generated content for one material
pub async fn content_get(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Value>> {
    let contents = state.materials.content(&user, &id).await?;
    Ok(ApiResponse::success(contents_to_api_values(&contents)))
}
