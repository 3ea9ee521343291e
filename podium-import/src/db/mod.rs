//! SQLite persistence for podium-import
//!
//! One database file (under the root folder) holds the athlete directory,
//! imported results, the incident queue and, when the SQLite session store
//! is used, staged extractions.

pub mod athletes;
pub mod incidents;
pub mod results;
pub mod sessions;

pub use athletes::SqliteAthleteDirectory;
pub use incidents::SqliteIncidentStore;
pub use results::SqliteResultStore;
pub use sessions::SqliteSessionStore;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Open (creating if needed) the database at `db_path` and create tables
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    tracing::debug!(path = %db_path.display(), "Connecting to database");

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_millis(250))
                .foreign_keys(true),
        )
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    init_tables(&pool)
        .await
        .context("Failed to initialize database tables")?;

    Ok(pool)
}

/// Create all tables and indexes if they don't exist
///
/// `results.categoria` is `NOT NULL DEFAULT ''`: an absent category is
/// stored as the empty string so the unique key treats it as one value.
pub async fn init_tables(pool: &SqlitePool) -> podium_common::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS athletes (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            club_id TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_athletes_full_name ON athletes(full_name)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            competition_id TEXT NOT NULL,
            athlete_id TEXT NOT NULL,
            categoria TEXT NOT NULL DEFAULT '',
            club_id TEXT,
            posicion INTEGER,
            dorsal TEXT,
            tiempo_ms INTEGER,
            puntos REAL,
            source_file TEXT NOT NULL,
            source_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (competition_id, athlete_id, categoria)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_incidents (
            id TEXT PRIMARY KEY,
            competition_id TEXT NOT NULL,
            row_number INTEGER NOT NULL,
            raw_row TEXT NOT NULL,
            reason TEXT NOT NULL,
            suggestions TEXT NOT NULL DEFAULT '[]',
            fingerprint TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_import_incidents_competition ON import_incidents(competition_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS extraction_sessions (
            extraction_id TEXT PRIMARY KEY,
            competition_id TEXT NOT NULL,
            file_reference TEXT NOT NULL,
            source_hash TEXT NOT NULL,
            headers TEXT NOT NULL,
            rows TEXT NOT NULL,
            detected_columns TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Database tables initialized (athletes, results, import_incidents, extraction_sessions)");

    Ok(())
}

/// Fixed-width RFC 3339 (microseconds, `Z`) so TEXT ordering is chronological
pub(crate) fn format_timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Parse a UUID stored as TEXT
pub(crate) fn parse_uuid(column: &str, value: &str) -> podium_common::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|e| podium_common::Error::Internal(format!("Invalid UUID in {}: {}", column, e)))
}

/// Parse an RFC 3339 timestamp stored as TEXT
pub(crate) fn parse_timestamp(
    column: &str,
    value: &str,
) -> podium_common::Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| podium_common::Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_file_and_is_repeatable() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("podium.db");

        let pool = init_database_pool(&db_path).await.unwrap();
        assert!(db_path.exists());

        init_tables(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(
            tables,
            vec!["athletes", "extraction_sessions", "import_incidents", "results"]
        );
    }

    #[test]
    fn test_parse_helpers_reject_garbage() {
        assert!(parse_uuid("id", "not-a-uuid").is_err());
        assert!(parse_timestamp("created_at", "yesterday").is_err());
        assert!(parse_timestamp("created_at", "2026-10-16T10:00:00+00:00").is_ok());
    }

    #[test]
    fn test_timestamps_sort_as_text() {
        let earlier = chrono::DateTime::parse_from_rfc3339("2026-10-16T10:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let later = earlier + chrono::Duration::microseconds(1500);

        let (a, b) = (format_timestamp(earlier), format_timestamp(later));
        assert_eq!(a, "2026-10-16T10:00:00.000000Z");
        assert!(a < b);
        assert_eq!(parse_timestamp("t", &b).unwrap(), later);
    }
}
