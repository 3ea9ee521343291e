//! Stub text sources
//!
//! Scripted stand-ins for the PDF parser and the OCR engine, counting how
//! often they are called.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use podium_common::{Error, Result};
use podium_import::types::{OcrEngine, PdfTextExtractor};

/// PDF extractor returning fixed text, or failing when built with `failing`
#[derive(Debug, Default)]
pub struct StubPdf {
    text: Option<String>,
    calls: AtomicUsize,
}

impl StubPdf {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfTextExtractor for StubPdf {
    async fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| Error::Extraction("stub: not a PDF".to_string()))
    }
}

/// OCR engine returning fixed text, or failing when built with `failing`
#[derive(Debug, Default)]
pub struct StubOcr {
    text: Option<String>,
    calls: AtomicUsize,
}

impl StubOcr {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for StubOcr {
    async fn recognize(&self, _bytes: &[u8], language: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(language, "spa");
        self.text
            .clone()
            .ok_or_else(|| Error::Extraction("stub: OCR engine unavailable".to_string()))
    }
}
