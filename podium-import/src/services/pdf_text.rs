//! PDF text layer extraction (lopdf)

use async_trait::async_trait;
use lopdf::Document;
use podium_common::{Error, Result};

use crate::types::PdfTextExtractor;

/// Extracts the embedded text of every page with `lopdf`
///
/// Parsing is CPU bound and runs on the blocking pool. Scanned documents
/// parse fine but yield blank text; the caller decides whether to fall back
/// to OCR.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextExtractor;

impl LopdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PdfTextExtractor for LopdfTextExtractor {
    async fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|e| Error::Internal(format!("PDF extraction task panicked: {}", e)))?
    }
}

fn extract_pages(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes)
        .map_err(|e| Error::Extraction(format!("Failed to load PDF: {}", e)))?;

    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                tracing::debug!(page = page_number, error = %e, "Page has no extractable text");
            }
        }
    }

    Ok(text)
}
