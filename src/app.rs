use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    BoxError, Router,
};
use std::time::Duration;
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full router with global middleware applied
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Public
        .merge(public_routes())
        // Protected API
        .merge(
            Router::new()
                .merge(user_routes())
                .merge(material_routes())
                .merge(chat_routes())
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    jwt_auth_middleware,
                )),
        )
        .with_state(state)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(Duration::from_secs(config.api.request_timeout_secs)),
        )
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(public::health))
        .route("/api/users/register", post(public::user_register))
        .route("/api/users/sync-supabase", post(public::user_sync))
}

fn user_routes() -> Router<AppState> {
    Router::new().route("/api/users/me", get(protected::user_me))
}

fn material_routes() -> Router<AppState> {
    use protected::material;

    Router::new()
        // Collection
        .route(
            "/api/materials",
            get(material::material_list).post(material::material_post),
        )
        .route(
            "/api/materials/all-with-content",
            get(material::material_list_with_content),
        )
        // Individual material
        .route(
            "/api/materials/:id",
            get(material::material_get).delete(material::material_delete),
        )
        .route("/api/materials/:id/summarize", post(material::summarize_post))
        .route("/api/materials/:id/generate-quiz", post(material::quiz_post))
        .route("/api/materials/:id/content", get(material::content_get))
}

fn chat_routes() -> Router<AppState> {
    Router::new().route("/api/chat/:materialId", post(protected::ask_question))
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request exceeded the configured timeout");
        ApiError::request_timeout("Request timed out")
    } else {
        tracing::error!("Unhandled middleware error: {}", err);
        ApiError::internal_server_error("Server Error")
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if config.is_development() || config.security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
