use axum::Extension;
use serde_json::Value;

use crate::api::format::user_to_api_value;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/users/me - The local user behind the bearer token
pub async fn user_me(Extension(AuthUser(user)): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(user_to_api_value(&user)))
}
