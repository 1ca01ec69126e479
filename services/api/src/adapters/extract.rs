//! services/api/src/adapters/extract.rs
//!
//! Text extraction for uploaded notes. PDFs go through `pdf-extract`, anything
//! else is read as UTF-8 text.

use async_trait::async_trait;
use askmynotes_core::ports::{PortError, PortResult, TextExtractor};
use tracing::{error, info};

/// Extracts text from PDFs with an embedded text layer and from plain text files.
#[derive(Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

pub fn is_pdf(file_name: &str, content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) if ct.eq_ignore_ascii_case("application/pdf") => true,
        _ => file_name.to_lowercase().ends_with(".pdf"),
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> PortResult<String> {
        if !is_pdf(file_name, content_type) {
            return Ok(String::from_utf8_lossy(data).into_owned());
        }

        info!("Extracting text from PDF: {}", file_name);
        let bytes = data.to_vec();
        // PDF parsing is CPU-bound.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| {
                error!("PDF extraction task failed: {:?}", e);
                PortError::Unexpected(format!("Failed to extract text from PDF: {}", e))
            })?
            .map_err(|e| {
                error!("Error extracting text from PDF: {:?}", e);
                PortError::Unexpected(format!("Failed to extract text from PDF: {}", e))
            })?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_detection_uses_content_type_then_extension() {
        assert!(is_pdf("notes", Some("application/pdf")));
        assert!(is_pdf("Notes.PDF", None));
        assert!(is_pdf("notes.pdf", Some("application/octet-stream")));
        assert!(!is_pdf("notes.txt", Some("text/plain")));
        assert!(!is_pdf("notes.md", None));
    }

    #[tokio::test]
    async fn plain_text_is_decoded() {
        let extractor = PdfTextExtractor::new();
        let text = extractor
            .extract_text("notes.txt", Some("text/plain"), "Photosynthesis uses light.".as_bytes())
            .await
            .unwrap();
        assert_eq!(text, "Photosynthesis uses light.");
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_rejected() {
        let extractor = PdfTextExtractor::new();
        let text = extractor
            .extract_text("notes.txt", None, &[b'o', b'k', 0xff])
            .await
            .unwrap();
        assert!(text.starts_with("ok"));
    }

    #[tokio::test]
    async fn broken_pdf_reports_extraction_failure() {
        let extractor = PdfTextExtractor::new();
        let err = extractor
            .extract_text("notes.pdf", Some("application/pdf"), b"definitely not a pdf")
            .await
            .unwrap_err();
        match err {
            PortError::Unexpected(msg) => assert!(msg.starts_with("Failed to extract text from PDF")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
