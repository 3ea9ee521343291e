//! Integration tests for the SQLite stores
//!
//! Results upsert, incident queue, extraction sessions and the athlete
//! directory against a temp database.

mod helpers;

use std::time::Duration;

use uuid::Uuid;

use helpers::{create_test_db, seed_athlete};
use podium_import::db::{
    SqliteAthleteDirectory, SqliteIncidentStore, SqliteResultStore, SqliteSessionStore,
};
use podium_import::models::{
    AthleteRef, ColumnMapping, ExtractionSession, Field, ImportIncident, IncidentReason,
    NormalizedRow, RawRow, RawTable, ResultRecord, SourceRef, UpsertOutcome,
};
use podium_import::types::{AthleteDirectory, IncidentStore, ResultStore, SessionStore};

fn source() -> SourceRef {
    SourceRef {
        file: "/tmp/resultados.pdf".to_string(),
        hash: "ab".repeat(32),
    }
}

fn record(competition: Uuid, athlete: &AthleteRef, categoria: Option<&str>, puntos: f64) -> ResultRecord {
    let row = NormalizedRow {
        posicion: Some(1),
        nombre: athlete.full_name.clone(),
        categoria: categoria.map(str::to_string),
        puntos: Some(puntos),
        ..NormalizedRow::default()
    };
    ResultRecord::from_row(competition, athlete, &row, source())
}

fn staged_session(competition: Uuid, ttl: Duration) -> ExtractionSession {
    let table = RawTable {
        headers: vec!["Puesto".to_string(), "Apellido y Nombre".to_string()],
        rows: vec![RawRow::from(vec!["1", "GIL, Ana"]), RawRow::from(vec!["2", ""])],
    };
    let mapping = ColumnMapping::default()
        .with(Field::Posicion, 0)
        .with(Field::Nombre, 1);
    ExtractionSession::new(
        competition,
        "/tmp/resultados.pdf".to_string(),
        "cd".repeat(32),
        table,
        mapping,
        ttl,
    )
}

// ============================================================================
// Results
// ============================================================================

#[tokio::test]
async fn test_upsert_inserts_then_updates_same_key() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let store = SqliteResultStore::new(pool.clone());
    let competition = Uuid::new_v4();
    let athlete = seed_athlete(&pool, "Ana Gil", None).await;

    let first = store
        .upsert(&record(competition, &athlete, Some("Mayores"), 10.0))
        .await
        .unwrap();
    let second = store
        .upsert(&record(competition, &athlete, Some("Mayores"), 12.0))
        .await
        .unwrap();

    assert_eq!(first, UpsertOutcome::Inserted);
    assert_eq!(second, UpsertOutcome::Updated);
    assert_eq!(store.count_for_competition(competition).await.unwrap(), 1);

    let stored = store.list_for_competition(competition).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].puntos, Some(12.0));
    assert_eq!(stored[0].key.athlete_id, athlete.id);
    assert_eq!(stored[0].source, source());
}

#[tokio::test]
async fn test_upsert_without_category_is_idempotent() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let store = SqliteResultStore::new(pool.clone());
    let competition = Uuid::new_v4();
    let athlete = seed_athlete(&pool, "Luis Sanz", None).await;

    store
        .upsert(&record(competition, &athlete, None, 8.0))
        .await
        .unwrap();
    let again = store
        .upsert(&record(competition, &athlete, None, 8.0))
        .await
        .unwrap();

    assert_eq!(again, UpsertOutcome::Updated);
    let stored = store.list_for_competition(competition).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].key.categoria, None);
}

#[tokio::test]
async fn test_categories_are_separate_results() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let store = SqliteResultStore::new(pool.clone());
    let competition = Uuid::new_v4();
    let athlete = seed_athlete(&pool, "Ana Gil", None).await;

    for categoria in [Some("Mayores"), Some("Juveniles"), None] {
        let outcome = store
            .upsert(&record(competition, &athlete, categoria, 5.0))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
    }

    // Another competition does not see them
    assert_eq!(store.count_for_competition(competition).await.unwrap(), 3);
    assert_eq!(store.count_for_competition(Uuid::new_v4()).await.unwrap(), 0);

    let categorias: Vec<Option<String>> = store
        .list_for_competition(competition)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.key.categoria)
        .collect();
    assert_eq!(
        categorias,
        vec![None, Some("Juveniles".to_string()), Some("Mayores".to_string())]
    );
}

// ============================================================================
// Incidents
// ============================================================================

#[tokio::test]
async fn test_incidents_are_queued_once() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let store = SqliteIncidentStore::new(pool);
    let competition = Uuid::new_v4();
    let suggestion = Uuid::new_v4();

    let batch = |first_row: usize| {
        vec![
            ImportIncident::new(
                competition,
                first_row,
                RawRow::from(vec!["3", "", "Mayores"]),
                IncidentReason::NombreFaltante,
                Vec::new(),
            ),
            ImportIncident::new(
                competition,
                first_row + 1,
                RawRow::from(vec!["4", "PEREZ, Juan", "Mayores"]),
                IncidentReason::DeportistaAmbiguo,
                vec![suggestion],
            ),
        ]
    };

    assert_eq!(store.insert_many(&batch(3)).await.unwrap(), 2);
    // Same raw rows from a second import
    assert_eq!(store.insert_many(&batch(3)).await.unwrap(), 0);
    assert_eq!(store.insert_many(&[]).await.unwrap(), 0);

    let queued = store.list_for_competition(competition).await.unwrap();
    assert_eq!(queued.len(), 2);
    assert_eq!(queued[0].row_number, 3);
    assert_eq!(queued[0].reason, IncidentReason::NombreFaltante);
    assert_eq!(queued[1].reason, IncidentReason::DeportistaAmbiguo);
    assert_eq!(queued[1].suggestions, vec![suggestion]);
    assert_eq!(queued[1].raw_row.cell(1), Some("PEREZ, Juan"));

    assert!(store
        .list_for_competition(Uuid::new_v4())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_requeued_incident_refreshes_suggestions() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let store = SqliteIncidentStore::new(pool);
    let competition = Uuid::new_v4();
    let first = Uuid::new_v4();
    let registered_later = Uuid::new_v4();

    let ambiguous = |suggestions: Vec<Uuid>| {
        ImportIncident::new(
            competition,
            4,
            RawRow::from(vec!["4", "PEREZ, Juan", "Mayores"]),
            IncidentReason::DeportistaAmbiguo,
            suggestions,
        )
    };

    assert_eq!(store.insert_many(&[ambiguous(vec![first])]).await.unwrap(), 1);
    assert_eq!(
        store
            .insert_many(&[ambiguous(vec![first, registered_later])])
            .await
            .unwrap(),
        0
    );

    let queued = store.list_for_competition(competition).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].suggestions, vec![first, registered_later]);
}

// ============================================================================
// Extraction sessions
// ============================================================================

#[tokio::test]
async fn test_session_round_trip_and_single_use() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let store = SqliteSessionStore::new(pool, Duration::from_secs(3600));
    let competition = Uuid::new_v4();
    let session = staged_session(competition, Duration::from_secs(3600));

    let id = store.create(session.clone()).await.unwrap();
    assert_eq!(id, session.extraction_id);

    let loaded = store.get(id).await.unwrap().unwrap();
    assert_eq!(loaded.competition_id, competition);
    assert_eq!(loaded.headers, session.headers);
    assert_eq!(loaded.rows, session.rows);
    assert_eq!(loaded.detected_columns, session.detected_columns);
    assert_eq!(loaded.source_hash, session.source_hash);
    assert!(loaded.expires_at > loaded.created_at);

    // get does not consume
    assert!(store.get(id).await.unwrap().is_some());

    let consumed = store.consume(id).await.unwrap();
    assert_eq!(consumed.map(|s| s.extraction_id), Some(id));
    assert!(store.consume(id).await.unwrap().is_none());
    assert!(store.get(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_sessions_are_gone_and_purged() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let expired = SqliteSessionStore::new(pool.clone(), Duration::ZERO);
    let live = SqliteSessionStore::new(pool.clone(), Duration::from_secs(3600));
    let competition = Uuid::new_v4();

    let stale_a = expired
        .create(staged_session(competition, Duration::ZERO))
        .await
        .unwrap();
    expired
        .create(staged_session(competition, Duration::ZERO))
        .await
        .unwrap();
    let fresh = live
        .create(staged_session(competition, Duration::from_secs(3600)))
        .await
        .unwrap();

    assert!(live.get(stale_a).await.unwrap().is_none());
    assert!(live.consume(stale_a).await.unwrap().is_none());

    // stale_a was evicted by get; one expired row remains
    assert_eq!(live.purge_expired().await.unwrap(), 1);
    assert_eq!(live.purge_expired().await.unwrap(), 0);
    assert!(live.get(fresh).await.unwrap().is_some());
}

#[tokio::test]
async fn test_unknown_session_is_absent() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let store = SqliteSessionStore::new(pool, Duration::from_secs(60));

    assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    assert!(store.consume(Uuid::new_v4()).await.unwrap().is_none());
}

// ============================================================================
// Athlete directory
// ============================================================================

#[tokio::test]
async fn test_find_by_full_name_is_exact() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let club = Uuid::new_v4();
    let ana = seed_athlete(&pool, "Ana Gil", Some(club)).await;
    seed_athlete(&pool, "Juan Perez", None).await;
    seed_athlete(&pool, "Juan Perez", None).await;
    let directory = SqliteAthleteDirectory::new(pool.clone());

    let found = directory.find_by_full_name("Ana Gil").await.unwrap();
    assert_eq!(found, vec![ana]);
    assert_eq!(found[0].club_id, Some(club));

    assert_eq!(directory.find_by_full_name("Juan Perez").await.unwrap().len(), 2);
    assert!(directory.find_by_full_name("ana gil").await.unwrap().is_empty());
    assert!(directory.find_by_full_name("Ana").await.unwrap().is_empty());

    let all = podium_import::db::athletes::list_athletes(&pool).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].full_name, "Ana Gil");
}
