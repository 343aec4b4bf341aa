//! Document text extraction
//!
//! Turns an uploaded blob into plain text according to its declared file
//! type. Library diagnostics never leave this module; callers get an
//! `ExtractionError` whose message is safe to show to the uploader.

mod docx;
mod pdf;
mod text;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use text::TextExtractor;

use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::FileType;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to parse file content. Reason: {reason}")]
    Failed { reason: String },

    #[error("No text content found in the file. The file may be empty or contain only images.")]
    EmptyContent,
}

impl ExtractionError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ExtractionError::Failed {
            reason: reason.into(),
        }
    }
}

/// Extraction seam, injected through `AppState`.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, bytes: Vec<u8>, file_type: FileType) -> Result<String, ExtractionError>;
}

/// Production extractor. PDF and DOCX parsing is CPU-bound and runs on the
/// blocking pool.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for DocumentExtractor {
    async fn extract(&self, bytes: Vec<u8>, file_type: FileType) -> Result<String, ExtractionError> {
        let text = match file_type {
            FileType::Txt => TextExtractor::extract(bytes)?,
            FileType::Pdf => run_blocking(move || PdfExtractor::extract(&bytes)).await?,
            FileType::Docx => run_blocking(move || DocxExtractor::extract(&bytes)).await?,
        };
        ensure_not_blank(text)
    }
}

async fn run_blocking<F>(f: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, ExtractionError> + Send + 'static,
{
    // A panic inside a format parser surfaces here as a JoinError
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("Extraction task failed: {}", e);
        ExtractionError::failed("the document could not be read")
    })?
}

/// Rejects empty and whitespace-only text.
pub fn ensure_not_blank(text: String) -> Result<String, ExtractionError> {
    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyContent);
    }
    Ok(text)
}
