//! PDF text extraction
//!
//! Extracts text content from PDF documents using pdf-extract.

use super::ExtractionError;

/// PDF content extractor
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract text content from PDF bytes
    pub fn extract(bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            tracing::warn!("PDF extraction error: {}", e);
            ExtractionError::failed("the PDF could not be read (it may be corrupted or password-protected)")
        })?;

        Ok(Self::clean_text(&text))
    }

    /// Collapse runs of blank lines left behind by page breaks
    fn clean_text(text: &str) -> String {
        text.lines()
            .map(|l| l.trim())
            .fold(Vec::new(), |mut acc: Vec<&str>, line| {
                if !line.is_empty() || acc.last().map(|l| !l.is_empty()).unwrap_or(false) {
                    acc.push(line);
                }
                acc
            })
            .join("\n")
            .trim()
            .to_string()
    }
}
