//! Athlete directory

use async_trait::async_trait;
use chrono::Utc;
use podium_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, parse_uuid};
use crate::models::AthleteRef;
use crate::types::AthleteDirectory;

/// Register an athlete, returning the new id
pub async fn add_athlete(pool: &SqlitePool, full_name: &str, club_id: Option<Uuid>) -> Result<AthleteRef> {
    let athlete = AthleteRef {
        id: Uuid::new_v4(),
        full_name: full_name.trim().to_string(),
        club_id,
    };

    sqlx::query("INSERT INTO athletes (id, full_name, club_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(athlete.id.to_string())
        .bind(&athlete.full_name)
        .bind(athlete.club_id.map(|id| id.to_string()))
        .bind(format_timestamp(Utc::now()))
        .execute(pool)
        .await?;

    tracing::debug!(athlete_id = %athlete.id, full_name = %athlete.full_name, "Athlete added");
    Ok(athlete)
}

/// All athletes, by name
pub async fn list_athletes(pool: &SqlitePool) -> Result<Vec<AthleteRef>> {
    let rows = sqlx::query("SELECT id, full_name, club_id FROM athletes ORDER BY full_name, id")
        .fetch_all(pool)
        .await?;

    rows.iter().map(athlete_from_row).collect()
}

fn athlete_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<AthleteRef> {
    let id: String = row.get("id");
    let club_id: Option<String> = row.get("club_id");
    Ok(AthleteRef {
        id: parse_uuid("athletes.id", &id)?,
        full_name: row.get("full_name"),
        club_id: club_id
            .map(|club| parse_uuid("athletes.club_id", &club))
            .transpose()?,
    })
}

/// [`AthleteDirectory`] over the `athletes` table
#[derive(Debug, Clone)]
pub struct SqliteAthleteDirectory {
    pool: SqlitePool,
}

impl SqliteAthleteDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AthleteDirectory for SqliteAthleteDirectory {
    async fn find_by_full_name(&self, name: &str) -> Result<Vec<AthleteRef>> {
        let rows = sqlx::query("SELECT id, full_name, club_id FROM athletes WHERE full_name = ? ORDER BY id")
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(athlete_from_row).collect()
    }
}
