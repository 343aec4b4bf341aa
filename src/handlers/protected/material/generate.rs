use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use crate::api::format::content_to_api_value;
use crate::database::InsertOutcome;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// 201 when this request stored the row, 200 when it was already there
fn cached_response(outcome: InsertOutcome) -> ApiResponse<Value> {
    let created = outcome.was_created();
    let body = content_to_api_value(&outcome.into_inner());
    if created {
        ApiResponse::created(body)
    } else {
        ApiResponse::success(body)
    }
}

/// POST /api/materials/:id/summarize - Get or generate the summary
///
/// Expected Output:
/// ```json
/// {
///   "_id": "uuid",
///   "material": "uuid",
///   "user": "uuid",
///   "type": "summary",
///   "content": "...",
///   "createdAt": "2025-01-01T00:00:00Z",
///   "updatedAt": "2025-01-01T00:00:00Z"
/// }
/// ```
pub async fn summarize_post(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let outcome = state.materials.summarize(&user, &id).await?;
    Ok(cached_response(outcome))
}

/// POST /api/materials/:id/generate-quiz - Get or generate the quiz
///
/// `content` holds the quiz as JSON-encoded text:
/// `[{"question": "...", "options": ["a","b","c","d"], "correctAnswer": "a"}]`
pub async fn quiz_post(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let outcome = state
        .materials
        .generate_quiz(&user, &id)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to generate quiz."))?;
    Ok(cached_response(outcome))
}
