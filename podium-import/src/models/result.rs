//! Normalized rows and persisted competition results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One table row after the column mapping and text normalizer are applied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    pub posicion: Option<i64>,
    pub dorsal: Option<String>,
    /// Canonical "Nombre Apellido" form; empty when the row has no name
    pub nombre: String,
    pub categoria: Option<String>,
    pub club: Option<String>,
    pub tiempo_ms: Option<i64>,
    pub puntos: Option<f64>,
}

/// Athlete as known to the athlete directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteRef {
    pub id: Uuid,
    pub full_name: String,
    pub club_id: Option<Uuid>,
}

/// Unique key of a stored result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultKey {
    pub competition_id: Uuid,
    pub athlete_id: Uuid,
    pub categoria: Option<String>,
}

/// Where a result was imported from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// File reference given to `extract`
    pub file: String,
    /// Hex SHA-256 of the file content
    pub hash: String,
}

/// Persisted competition result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub key: ResultKey,
    pub club_id: Option<Uuid>,
    pub posicion: Option<i64>,
    pub dorsal: Option<String>,
    pub tiempo_ms: Option<i64>,
    pub puntos: Option<f64>,
    pub source: SourceRef,
    pub updated_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Build the record for a row resolved to `athlete`
    pub fn from_row(
        competition_id: Uuid,
        athlete: &AthleteRef,
        row: &NormalizedRow,
        source: SourceRef,
    ) -> Self {
        Self {
            key: ResultKey {
                competition_id,
                athlete_id: athlete.id,
                categoria: row.categoria.clone(),
            },
            club_id: athlete.club_id,
            posicion: row.posicion,
            dorsal: row.dorsal.clone(),
            tiempo_ms: row.tiempo_ms,
            puntos: row.puntos,
            source,
            updated_at: Utc::now(),
        }
    }
}

/// Whether an upsert created or replaced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
