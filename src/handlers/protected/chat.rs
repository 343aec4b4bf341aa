use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::ApiJson;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ChatTurn;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: Option<String>,
    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// POST /api/chat/:materialId - Ask a question grounded in one material
///
/// Expected Input:
/// ```json
/// {
///   "question": "What is photosynthesis?",
///   "history": [
///     { "role": "user", "text": "..." },
///     { "role": "model", "parts": [{ "text": "..." }] }
///   ]
/// }
/// ```
///
/// Expected Output:
/// ```json
/// { "answer": "..." }
/// ```
pub async fn ask_question(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(material_id): Path<String>,
    ApiJson(payload): ApiJson<AskRequest>,
) -> ApiResult<Value> {
    let answer = state
        .materials
        .chat(&user, &material_id, payload.question.as_deref(), &payload.history)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to get an answer."))?;

    Ok(ApiResponse::success(json!({ "answer": answer })))
}
