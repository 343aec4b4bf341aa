use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::{bearer_token, AuthError};
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// The local user behind a verified bearer token
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// JWT authentication middleware: verifies the bearer token, resolves its
/// subject to a local user and injects `AuthUser` into the request.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader("not visible ASCII")))
        .transpose()?;

    let claims = state.verifier.verify(bearer_token(header)?)?;

    let user = state.repo.find_user_by_auth_id(&claims.sub).await?;
    let user = user.ok_or(AuthError::UserNotProvisioned(claims.sub))?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}
