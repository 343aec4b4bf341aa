//! DOCX text extraction
//!
//! A .docx file is a zip container; the body text lives in
//! `word/document.xml` as `w:t` runs grouped into `w:p` paragraphs.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::{Cursor, Read};

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

pub struct DocxExtractor;

impl DocxExtractor {
    pub fn extract(bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            tracing::warn!("DOCX container error: {}", e);
            ExtractionError::failed("the file is not a valid Word document")
        })?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|_| ExtractionError::failed("the Word document has no body"))?
            .read_to_string(&mut xml)
            .map_err(|e| {
                tracing::warn!("DOCX read error: {}", e);
                ExtractionError::failed("the Word document could not be read")
            })?;

        Self::document_text(&xml)
    }

    fn document_text(xml: &str) -> Result<String, ExtractionError> {
        let mut reader = Reader::from_str(xml);
        let mut out = String::new();
        let mut in_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:p" => out.push('\n'),
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"w:tab" => out.push('\t'),
                    b"w:br" | b"w:cr" => out.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(t)) if in_text => {
                    let text = t.unescape().map_err(|e| {
                        tracing::warn!("DOCX XML escape error: {}", e);
                        ExtractionError::failed("the Word document contains malformed text")
                    })?;
                    out.push_str(&text);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("DOCX XML error at {}: {}", reader.buffer_position(), e);
                    return Err(ExtractionError::failed("the Word document is malformed"));
                }
            }
        }

        Ok(out.trim_end().to_string())
    }
}
