pub mod gemini;
pub mod generation;
pub mod material;
pub mod storage;
pub mod user;

pub use gemini::GeminiClient;
pub use generation::{ChatTurn, GenerationError, GenerationService, Generator, Quiz, QuizQuestion, Role};
pub use material::{DeleteOutcome, MaterialService, RegisterMaterial};
pub use storage::{BlobStore, StorageError, SupabaseStorage};
pub use user::{RegisterUser, SyncEvent, SyncOutcome, SyncRecord, UserService};

use std::collections::HashMap;
use thiserror::Error;

use crate::auth::AuthError;
use crate::content::ExtractionError;
use crate::database::DatabaseError;

/// Failures of a business operation. Handlers convert these into `ApiError`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    Duplicate(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors,
        }
    }
}

/// Collects a field error for each absent or blank value.
pub(crate) fn require_fields<'a>(
    fields: impl IntoIterator<Item = (&'static str, Option<&'a str>)>,
) -> HashMap<String, String> {
    fields
        .into_iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| (name.to_string(), "This field is required".to_string()))
        .collect()
}
