//! Import incident queue
//!
//! Rows that could not be turned into results wait here for a human. The
//! `fingerprint` column is unique, so confirming the same sheet twice does
//! not queue the same problem twice. A repeated incident refreshes the
//! stored suggestions, since the athlete directory may have changed.

use async_trait::async_trait;
use podium_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::{ImportIncident, IncidentReason, RawRow};
use crate::types::IncidentStore;

/// [`IncidentStore`] over the `import_incidents` table
#[derive(Debug, Clone)]
pub struct SqliteIncidentStore {
    pool: SqlitePool,
}

impl SqliteIncidentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IncidentStore for SqliteIncidentStore {
    async fn insert_many(&self, incidents: &[ImportIncident]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for incident in incidents {
            let raw_row = serde_json::to_string(&incident.raw_row)
                .map_err(|e| Error::Internal(format!("Failed to serialize raw_row: {}", e)))?;
            let suggestions = serde_json::to_string(&incident.suggestions)
                .map_err(|e| Error::Internal(format!("Failed to serialize suggestions: {}", e)))?;

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO import_incidents (
                    id, competition_id, row_number, raw_row, reason,
                    suggestions, fingerprint, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(incident.id.to_string())
            .bind(incident.competition_id.to_string())
            .bind(incident.row_number as i64)
            .bind(raw_row)
            .bind(incident.reason.code())
            .bind(&suggestions)
            .bind(&incident.fingerprint)
            .bind(format_timestamp(incident.created_at))
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                written += 1;
                continue;
            }

            sqlx::query("UPDATE import_incidents SET suggestions = ? WHERE fingerprint = ?")
                .bind(&suggestions)
                .bind(&incident.fingerprint)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(submitted = incidents.len(), written, "Incidents stored");
        Ok(written)
    }

    async fn list_for_competition(&self, competition_id: Uuid) -> Result<Vec<ImportIncident>> {
        let rows = sqlx::query(
            r#"
            SELECT id, competition_id, row_number, raw_row, reason, suggestions,
                   fingerprint, created_at
            FROM import_incidents
            WHERE competition_id = ?
            ORDER BY created_at, row_number
            "#,
        )
        .bind(competition_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let competition_id: String = row.get("competition_id");
                let raw_row: String = row.get("raw_row");
                let raw_row: RawRow = serde_json::from_str(&raw_row)
                    .map_err(|e| Error::Internal(format!("Failed to deserialize raw_row: {}", e)))?;
                let suggestions: String = row.get("suggestions");
                let suggestions: Vec<Uuid> = serde_json::from_str(&suggestions).map_err(|e| {
                    Error::Internal(format!("Failed to deserialize suggestions: {}", e))
                })?;
                let reason: String = row.get("reason");
                let reason = IncidentReason::from_code(&reason)
                    .ok_or_else(|| Error::Internal(format!("Unknown incident reason '{}'", reason)))?;
                let created_at: String = row.get("created_at");

                Ok(ImportIncident {
                    id: parse_uuid("import_incidents.id", &id)?,
                    competition_id: parse_uuid("import_incidents.competition_id", &competition_id)?,
                    row_number: row.get::<i64, _>("row_number") as usize,
                    raw_row,
                    reason,
                    suggestions,
                    fingerprint: row.get("fingerprint"),
                    created_at: parse_timestamp("import_incidents.created_at", &created_at)?,
                })
            })
            .collect()
    }
}
