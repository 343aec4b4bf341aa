//! Plain text decoding

use super::ExtractionError;

/// Plain text extractor
pub struct TextExtractor;

impl TextExtractor {
    pub fn extract(bytes: Vec<u8>) -> Result<String, ExtractionError> {
        let text = String::from_utf8(bytes)
            .map_err(|_| ExtractionError::failed("the text file is not valid UTF-8"))?;
        // Editors on Windows like to prepend a BOM
        Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
    }
}
