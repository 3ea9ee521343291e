//! podium-import library interface
//!
//! Two-phase import of competition results from PDF sheets:
//! `extract` stages a table for review, `confirm` writes results and queues
//! incidents for rows that need a human.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::error::{ImportError, ImportResult};
pub use crate::services::{Collaborators, ImportOrchestrator, OrchestratorSettings};

use std::sync::Arc;

use podium_common::config::TomlConfig;
use sqlx::SqlitePool;

use crate::db::{SqliteAthleteDirectory, SqliteIncidentStore, SqliteResultStore, SqliteSessionStore};
use crate::services::{LocalFileSource, LopdfTextExtractor, TesseractOcr};

/// Production orchestrator over one SQLite database
///
/// Sessions are kept in SQLite so `extract` and `confirm` may run in
/// different processes.
pub fn build_orchestrator(pool: SqlitePool, config: &TomlConfig) -> ImportOrchestrator {
    let import = &config.import;
    let services = Collaborators {
        files: Arc::new(LocalFileSource::new()),
        pdf: Arc::new(LopdfTextExtractor::new()),
        ocr: Arc::new(TesseractOcr::new(import.ocr_command.clone())),
        athletes: Arc::new(SqliteAthleteDirectory::new(pool.clone())),
        results: Arc::new(SqliteResultStore::new(pool.clone())),
        incidents: Arc::new(SqliteIncidentStore::new(pool.clone())),
        sessions: Arc::new(SqliteSessionStore::new(pool, import.session_ttl())),
    };

    ImportOrchestrator::new(services, OrchestratorSettings::from(import))
}
