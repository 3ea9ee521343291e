//! Local filesystem source documents

use std::path::Path;

use async_trait::async_trait;
use podium_common::{Error, Result};

use crate::types::FileSource;

/// Reads source documents from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSource;

impl LocalFileSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSource for LocalFileSource {
    async fn size(&self, path: &Path) -> Result<u64> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!(
                "Not a regular file: {}",
                path.display()
            )));
        }
        Ok(metadata.len())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tracing::debug!(path = %path.display(), "Reading source file");
        Ok(tokio::fs::read(path).await?)
    }
}

/// Document type detected from the leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    /// Scanned page (PNG, JPEG, TIFF, ...); only OCR can read it
    Image,
    Unknown,
}

impl SourceKind {
    /// Sniff the file type from its magic bytes
    pub fn sniff(bytes: &[u8]) -> Self {
        match infer::get(bytes) {
            Some(kind) if kind.mime_type() == "application/pdf" => SourceKind::Pdf,
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => SourceKind::Image,
            _ => SourceKind::Unknown,
        }
    }
}

/// Hex SHA-256 of `bytes`, computed on the blocking pool
pub async fn content_hash(bytes: std::sync::Arc<[u8]>) -> Result<String> {
    use sha2::{Digest, Sha256};

    tokio::task::spawn_blocking(move || format!("{:x}", Sha256::digest(&bytes[..])))
        .await
        .map_err(|e| Error::Internal(format!("Hash task panicked: {}", e)))
}
