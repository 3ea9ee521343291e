//! Error types for podium-import
//!
//! File-level and session problems abort the operation and reach the caller.
//! Row-level problems never appear here: `confirm` turns them into incidents.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Import operation error
#[derive(Debug, Error)]
pub enum ImportError {
    /// Source file missing or unreadable
    #[error("Cannot read source file {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: podium_common::Error,
    },

    /// Source file over the configured size limit
    #[error("Source file {path} is {size} bytes, limit is {limit}")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Unknown, expired or already confirmed extraction
    #[error("Extraction not found: {0}")]
    ExtractionNotFound(Uuid),

    /// Confirm called for a competition other than the one extracted for
    #[error("Extraction {extraction_id} belongs to competition {expected}, not {actual}")]
    CompetitionMismatch {
        extraction_id: Uuid,
        expected: Uuid,
        actual: Uuid,
    },

    /// Persistence or infrastructure failure
    #[error(transparent)]
    Common(#[from] podium_common::Error),
}

impl ImportError {
    /// True for errors caused by the caller's input (the 4xx family)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ImportError::Common(_))
    }
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
