use axum::{extract::State, http::HeaderMap};
use serde_json::{json, Value};

use crate::api::format::registered_user_value;
use crate::api::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{RegisterUser, SyncEvent, SyncOutcome};
use crate::state::AppState;

pub const WEBHOOK_SECRET_HEADER: &str = "x-supabase-webhook-secret";

/// POST /api/users/register - Create the local user for a provider account
///
/// Expected Input:
/// ```json
/// { "authId": "provider-subject", "email": "user@example.com" }
/// ```
///
/// Expected Output (201):
/// ```json
/// { "_id": "uuid", "authId": "provider-subject", "email": "user@example.com" }
/// ```
pub async fn user_register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterUser>,
) -> ApiResult<Value> {
    let user = state.users.register(payload).await?;
    Ok(ApiResponse::created(registered_user_value(&user)))
}

/// POST /api/users/sync-supabase - Identity-provider user webhook
///
/// Requires the `x-supabase-webhook-secret` header. Only `INSERT` events
/// provision a user; anything else is acknowledged and ignored.
pub async fn user_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(event): ApiJson<SyncEvent>,
) -> ApiResult<Value> {
    let secret = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    let message = match state.users.sync(secret, event).await? {
        SyncOutcome::Ignored => "Event ignored",
        SyncOutcome::Synced(_) => "User synced successfully.",
    };
    Ok(ApiResponse::success(json!({ "message": message })))
}
