// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::content::ExtractionError;
use crate::database::DatabaseError;
use crate::services::generation::GenerationError;
use crate::services::storage::StorageError;
use crate::services::ServiceError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest {
        message: String,
        reason: Option<String>,
    },
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),
    UserNotProvisioned(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 408 Request Timeout
    RequestTimeout(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError {
        message: String,
        reason: Option<String>,
    },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. } => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::UserNotProvisioned(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::RequestTimeout(_) => 408,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError { .. } => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::UserNotProvisioned(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::RequestTimeout(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError { message, .. } => message,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Short cause string, only where it is safe to show
    pub fn reason(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest { reason, .. } => reason.as_deref(),
            ApiError::InternalServerError { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "message": self.message(),
            "code": self.error_code()
        });

        if let Some(reason) = self.reason() {
            response["error"] = json!(reason);
        }

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["field_errors"] = json!(field_errors);
        }

        response
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::UserNotProvisioned(_) => "USER_NOT_PROVISIONED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::RequestTimeout(_) => "REQUEST_TIMEOUT",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Replace the headline message of an upstream failure, keeping its cause.
    /// Handlers use this to say which operation failed.
    pub fn context(self, message: impl Into<String>) -> Self {
        match self {
            ApiError::InternalServerError { reason, .. } => ApiError::InternalServerError {
                message: message.into(),
                reason,
            },
            other => other,
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            reason: None,
        }
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn request_timeout(message: impl Into<String>) -> Self {
        ApiError::RequestTimeout(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            reason: None,
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ApiError::unauthorized("Not authorized, no token"),
            AuthError::MalformedHeader(msg) => {
                tracing::debug!("Rejected authorization header: {}", msg);
                ApiError::unauthorized("Not authorized, token failed")
            }
            AuthError::InvalidToken(msg) => {
                tracing::warn!("JWT verification failed: {}", msg);
                ApiError::unauthorized("Not authorized, token failed")
            }
            AuthError::SecretNotConfigured | AuthError::TokenGeneration(_) => {
                tracing::error!("JWT configuration error: {}", err);
                ApiError::internal_server_error("Authentication is misconfigured")
            }
            AuthError::UserNotProvisioned(sub) => {
                tracing::warn!("Valid token for subject '{}' but no local user", sub);
                ApiError::UserNotProvisioned("Not authorized, user not found in our DB".to_string())
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => ApiError::conflict(msg),
            DatabaseError::ConfigMissing(_) | DatabaseError::Migration(_) => {
                tracing::error!("Database setup error: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Decode(msg) => {
                tracing::error!("Row decode error: {}", msg);
                ApiError::internal_server_error("Server Error")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Server Error")
            }
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        tracing::warn!("File parsing failed: {}", err);
        ApiError::BadRequest {
            message: "Could not process the uploaded file.".to_string(),
            reason: Some(err.to_string()),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match &err {
            GenerationError::Unavailable { cause } => {
                tracing::error!("Generation provider failure: {}", cause);
            }
            GenerationError::InvalidFormat { raw } => {
                tracing::error!("Failed to parse generation response as a quiz: {}", raw);
            }
        }
        ApiError::InternalServerError {
            message: "Failed to generate content.".to_string(),
            reason: Some(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        tracing::error!("Object store failure: {:?}", err);
        ApiError::InternalServerError {
            message: "Server Error".to_string(),
            reason: Some(err.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::Unauthorized(msg) => ApiError::unauthorized(msg),
            ServiceError::Validation {
                message,
                field_errors,
            } => ApiError::validation_error(message, Some(field_errors)),
            ServiceError::Duplicate(msg) => ApiError::bad_request(msg),
            ServiceError::Auth(e) => e.into(),
            ServiceError::Database(e) => e.into(),
            ServiceError::Extraction(e) => e.into(),
            ServiceError::Generation(e) => e.into(),
            ServiceError::Storage(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
