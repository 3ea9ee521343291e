//! Database Test Utilities

use std::path::PathBuf;

use anyhow::Result;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use podium_import::db;
use podium_import::models::AthleteRef;

/// Create temporary test database with all tables
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_podium.db");
    let pool = db::init_database_pool(&db_path).await?;
    Ok((temp_dir, pool))
}

/// Register an athlete with an optional club
pub async fn seed_athlete(pool: &SqlitePool, full_name: &str, club_id: Option<Uuid>) -> AthleteRef {
    db::athletes::add_athlete(pool, full_name, club_id)
        .await
        .unwrap()
}

/// Write `bytes` as `name` inside the temp dir
pub fn write_source_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
