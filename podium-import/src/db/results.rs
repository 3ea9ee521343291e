//! Competition results
//!
//! One row per `(competition_id, athlete_id, categoria)`. Re-importing the
//! same sheet overwrites the row in place, so imports are idempotent.

use async_trait::async_trait;
use chrono::Utc;
use podium_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::{ResultKey, ResultRecord, SourceRef, UpsertOutcome};
use crate::types::ResultStore;
use crate::utils::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};

/// [`ResultStore`] over the `results` table
#[derive(Debug, Clone)]
pub struct SqliteResultStore {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteResultStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        }
    }

    pub fn with_max_lock_wait_ms(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self
    }

    /// Number of stored results for a competition
    pub async fn count_for_competition(&self, competition_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE competition_id = ?")
            .bind(competition_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn upsert(&self, record: &ResultRecord) -> Result<UpsertOutcome> {
        // Prepare all bind values before touching the database
        let competition_id = record.key.competition_id.to_string();
        let athlete_id = record.key.athlete_id.to_string();
        let categoria = record.key.categoria.clone().unwrap_or_default();
        let club_id = record.club_id.map(|id| id.to_string());
        let updated_at = format_timestamp(record.updated_at);
        let created_at = format_timestamp(Utc::now());

        let pool = &self.pool;
        let (competition_id, athlete_id, categoria) = (&competition_id, &athlete_id, &categoria);
        let (club_id, updated_at, created_at) = (&club_id, &updated_at, &created_at);

        retry_on_lock("upsert result", self.max_lock_wait_ms, || async move {
            let mut tx = pool.begin().await?;

            let existing: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM results WHERE competition_id = ? AND athlete_id = ? AND categoria = ?",
            )
            .bind(competition_id)
            .bind(athlete_id)
            .bind(categoria)
            .fetch_optional(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO results (
                    competition_id, athlete_id, categoria, club_id, posicion, dorsal,
                    tiempo_ms, puntos, source_file, source_hash, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(competition_id, athlete_id, categoria) DO UPDATE SET
                    club_id = excluded.club_id,
                    posicion = excluded.posicion,
                    dorsal = excluded.dorsal,
                    tiempo_ms = excluded.tiempo_ms,
                    puntos = excluded.puntos,
                    source_file = excluded.source_file,
                    source_hash = excluded.source_hash,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(competition_id)
            .bind(athlete_id)
            .bind(categoria)
            .bind(club_id)
            .bind(record.posicion)
            .bind(&record.dorsal)
            .bind(record.tiempo_ms)
            .bind(record.puntos)
            .bind(&record.source.file)
            .bind(&record.source.hash)
            .bind(created_at)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            Ok(if existing.is_some() {
                UpsertOutcome::Updated
            } else {
                UpsertOutcome::Inserted
            })
        })
        .await
    }

    async fn list_for_competition(&self, competition_id: Uuid) -> Result<Vec<ResultRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT competition_id, athlete_id, categoria, club_id, posicion, dorsal,
                   tiempo_ms, puntos, source_file, source_hash, updated_at
            FROM results
            WHERE competition_id = ?
            ORDER BY categoria, posicion IS NULL, posicion, athlete_id
            "#,
        )
        .bind(competition_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let competition_id: String = row.get("competition_id");
                let athlete_id: String = row.get("athlete_id");
                let categoria: String = row.get("categoria");
                let club_id: Option<String> = row.get("club_id");
                let updated_at: String = row.get("updated_at");

                Ok(ResultRecord {
                    key: ResultKey {
                        competition_id: parse_uuid("results.competition_id", &competition_id)?,
                        athlete_id: parse_uuid("results.athlete_id", &athlete_id)?,
                        categoria: Some(categoria).filter(|c| !c.is_empty()),
                    },
                    club_id: club_id
                        .map(|id| parse_uuid("results.club_id", &id))
                        .transpose()?,
                    posicion: row.get("posicion"),
                    dorsal: row.get("dorsal"),
                    tiempo_ms: row.get("tiempo_ms"),
                    puntos: row.get("puntos"),
                    source: SourceRef {
                        file: row.get("source_file"),
                        hash: row.get("source_hash"),
                    },
                    updated_at: parse_timestamp("results.updated_at", &updated_at)?,
                })
            })
            .collect()
    }
}
