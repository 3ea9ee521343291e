//! Extraction session persistence
//!
//! SQLite-backed [`SessionStore`]: staged extractions survive a restart and
//! are visible to every process sharing the database. Rows, headers and the
//! detected mapping are stored as JSON columns.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use podium_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::{ColumnMapping, ExtractionSession, RawRow};
use crate::types::SessionStore;

/// [`SessionStore`] over the `extraction_sessions` table
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
    ttl: Duration,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    async fn load(&self, extraction_id: Uuid) -> Result<Option<ExtractionSession>> {
        let row = sqlx::query(
            r#"
            SELECT extraction_id, competition_id, file_reference, source_hash,
                   headers, rows, detected_columns, created_at, expires_at
            FROM extraction_sessions
            WHERE extraction_id = ?
            "#,
        )
        .bind(extraction_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| session_from_row(&row)).transpose()
    }

    async fn delete(&self, extraction_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM extraction_sessions WHERE extraction_id = ?")
            .bind(extraction_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, mut session: ExtractionSession) -> Result<Uuid> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| Error::Config(format!("Session TTL out of range: {}", e)))?;
        session.expires_at = session.created_at + ttl;

        // Prepare all data before acquiring a connection
        let headers = to_json("headers", &session.headers)?;
        let rows = to_json("rows", &session.rows)?;
        let detected_columns = to_json("detected_columns", &session.detected_columns)?;

        sqlx::query(
            r#"
            INSERT INTO extraction_sessions (
                extraction_id, competition_id, file_reference, source_hash,
                headers, rows, detected_columns, created_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.extraction_id.to_string())
        .bind(session.competition_id.to_string())
        .bind(&session.file_reference)
        .bind(&session.source_hash)
        .bind(headers)
        .bind(rows)
        .bind(detected_columns)
        .bind(format_timestamp(session.created_at))
        .bind(format_timestamp(session.expires_at))
        .execute(&self.pool)
        .await?;

        tracing::debug!(extraction_id = %session.extraction_id, "Extraction session stored");
        Ok(session.extraction_id)
    }

    async fn get(&self, extraction_id: Uuid) -> Result<Option<ExtractionSession>> {
        match self.load(extraction_id).await? {
            None => {
                tracing::debug!(extraction_id = %extraction_id, "Unknown extraction session");
                Ok(None)
            }
            Some(session) if session.is_expired() => {
                self.delete(extraction_id).await?;
                tracing::warn!(extraction_id = %extraction_id, "Extraction session expired");
                Ok(None)
            }
            Some(session) => Ok(Some(session)),
        }
    }

    async fn consume(&self, extraction_id: Uuid) -> Result<Option<ExtractionSession>> {
        let session = self.get(extraction_id).await?;
        // Only the caller whose DELETE hits the row owns the session
        if session.is_some() && self.delete(extraction_id).await? {
            tracing::debug!(extraction_id = %extraction_id, "Extraction session consumed");
            return Ok(session);
        }
        Ok(None)
    }

    async fn purge_expired(&self) -> Result<usize> {
        let result = sqlx::query("DELETE FROM extraction_sessions WHERE expires_at <= ?")
            .bind(format_timestamp(Utc::now()))
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected() as usize;
        if purged > 0 {
            tracing::info!(purged, "Purged expired extraction sessions");
        }
        Ok(purged)
    }
}

fn to_json<T: serde::Serialize>(column: &str, value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize {}: {}", column, e)))
}

fn from_json<T: serde::de::DeserializeOwned>(column: &str, value: &str) -> Result<T> {
    serde_json::from_str(value)
        .map_err(|e| Error::Internal(format!("Failed to deserialize {}: {}", column, e)))
}

fn session_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ExtractionSession> {
    let extraction_id: String = row.get("extraction_id");
    let competition_id: String = row.get("competition_id");
    let headers: String = row.get("headers");
    let rows: String = row.get("rows");
    let detected_columns: String = row.get("detected_columns");
    let created_at: String = row.get("created_at");
    let expires_at: String = row.get("expires_at");

    Ok(ExtractionSession {
        extraction_id: parse_uuid("extraction_sessions.extraction_id", &extraction_id)?,
        competition_id: parse_uuid("extraction_sessions.competition_id", &competition_id)?,
        file_reference: row.get("file_reference"),
        source_hash: row.get("source_hash"),
        headers: from_json::<Vec<String>>("headers", &headers)?,
        rows: from_json::<Vec<RawRow>>("rows", &rows)?,
        detected_columns: from_json::<ColumnMapping>("detected_columns", &detected_columns)?,
        created_at: parse_timestamp("extraction_sessions.created_at", &created_at)?,
        expires_at: parse_timestamp("extraction_sessions.expires_at", &expires_at)?,
    })
}
