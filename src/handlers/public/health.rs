use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// GET /api/health - Liveness plus a database round trip
///
/// Expected Output:
/// ```json
/// { "status": "UP", "timestamp": "2025-01-01T00:00:00Z", "database": "ok" }
/// ```
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.repo.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "UP",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check database ping failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "DEGRADED",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
