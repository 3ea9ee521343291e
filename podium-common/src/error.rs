//! Common error types for Podium

use thiserror::Error;

/// Common result type for Podium operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by every collaborator of the import pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (unsupported file, oversized upload, bad identifier)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Text extraction backend failed (PDF parser or OCR engine)
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for SQLite lock contention, which is worth retrying
    pub fn is_database_locked(&self) -> bool {
        match self {
            Error::Database(db_err) => db_err.to_string().contains("database is locked"),
            _ => false,
        }
    }
}
