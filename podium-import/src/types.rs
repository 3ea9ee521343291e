//! Collaborator traits for the import pipeline
//!
//! The orchestrator only talks to the outside world through these traits:
//! - **Sources:** [`FileSource`], [`PdfTextExtractor`], [`OcrEngine`]
//! - **Directory:** [`AthleteDirectory`]
//! - **Persistence:** [`ResultStore`], [`IncidentStore`], [`SessionStore`]
//!
//! Production implementations live in `services` (files, PDF, OCR, in-memory
//! sessions) and `db` (SQLite). Tests substitute stubs.

use std::path::Path;

use async_trait::async_trait;
use podium_common::Result;
use uuid::Uuid;

use crate::models::{AthleteRef, ExtractionSession, ImportIncident, ResultRecord, UpsertOutcome};

/// Reads source documents
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Size in bytes, checked before reading
    async fn size(&self, path: &Path) -> Result<u64>;

    /// Read the whole file into memory
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Extracts the text layer of a PDF
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    /// Plain text of every page, pages separated by newlines
    ///
    /// # Errors
    /// Returns `Error::Extraction` when the bytes are not a readable PDF
    async fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// Recognizes text in scanned documents
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in `bytes` using `language` (e.g. `"spa"`)
    async fn recognize(&self, bytes: &[u8], language: &str) -> Result<String>;
}

/// Looks up athletes by name
#[async_trait]
pub trait AthleteDirectory: Send + Sync {
    /// Every athlete whose full name equals `name` exactly
    async fn find_by_full_name(&self, name: &str) -> Result<Vec<AthleteRef>>;
}

/// Stores competition results
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert or replace the record stored under `record.key`
    ///
    /// Must be idempotent: repeating the call only updates the same record.
    async fn upsert(&self, record: &ResultRecord) -> Result<UpsertOutcome>;

    /// Results of one competition, ordered by category then position
    async fn list_for_competition(&self, competition_id: Uuid) -> Result<Vec<ResultRecord>>;
}

/// Stores import incidents
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Persist a batch; incidents whose fingerprint is already stored only
    /// get their suggestions refreshed. Returns the number newly queued.
    async fn insert_many(&self, incidents: &[ImportIncident]) -> Result<usize>;

    /// Incidents of one competition, oldest first
    async fn list_for_competition(&self, competition_id: Uuid) -> Result<Vec<ImportIncident>>;
}

/// Holds staged extractions between `extract` and `confirm`
///
/// Expired sessions must be reported as absent by `get` and `consume`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stage a session, returning its identifier
    async fn create(&self, session: ExtractionSession) -> Result<Uuid>;

    /// Fetch a live session without invalidating it
    async fn get(&self, extraction_id: Uuid) -> Result<Option<ExtractionSession>>;

    /// Remove a session, returning it if it was live
    async fn consume(&self, extraction_id: Uuid) -> Result<Option<ExtractionSession>>;

    /// Evict every expired session, returning how many were removed
    async fn purge_expired(&self) -> Result<usize>;
}
