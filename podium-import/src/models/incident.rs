//! Import incidents: rows queued for manual review

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

use crate::models::RawRow;

/// Why a row could not be imported automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentReason {
    /// The mapped name column is empty
    #[serde(rename = "nombreFaltante")]
    NombreFaltante,
    /// The name matched zero or several athletes
    #[serde(rename = "deportistaAmbiguo")]
    DeportistaAmbiguo,
}

impl IncidentReason {
    pub fn code(&self) -> &'static str {
        match self {
            IncidentReason::NombreFaltante => "nombreFaltante",
            IncidentReason::DeportistaAmbiguo => "deportistaAmbiguo",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "nombreFaltante" => Some(IncidentReason::NombreFaltante),
            "deportistaAmbiguo" => Some(IncidentReason::DeportistaAmbiguo),
            _ => None,
        }
    }
}

impl fmt::Display for IncidentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A row that needs a human decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIncident {
    pub id: Uuid,
    pub competition_id: Uuid,
    /// 1-based position among the table's data rows
    pub row_number: usize,
    pub raw_row: RawRow,
    pub reason: IncidentReason,
    /// Candidate athletes for ambiguous matches
    pub suggestions: Vec<Uuid>,
    /// Content fingerprint used to drop duplicates on retried confirms
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

impl ImportIncident {
    pub fn new(
        competition_id: Uuid,
        row_number: usize,
        raw_row: RawRow,
        reason: IncidentReason,
        suggestions: Vec<Uuid>,
    ) -> Self {
        let fingerprint = incident_fingerprint(competition_id, row_number, reason, &raw_row);
        Self {
            id: Uuid::new_v4(),
            competition_id,
            row_number,
            raw_row,
            reason,
            suggestions,
            fingerprint,
            created_at: Utc::now(),
        }
    }
}

/// Hex SHA-256 over competition, row number, reason and raw cells
///
/// Re-confirming the same sheet reproduces the fingerprint; identical rows
/// at different positions stay distinct. Cells are separated by the ASCII
/// unit separator so `["a b"]` and `["a", "b"]` hash differently.
pub fn incident_fingerprint(
    competition_id: Uuid,
    row_number: usize,
    reason: IncidentReason,
    row: &RawRow,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(competition_id.as_bytes());
    hasher.update((row_number as u64).to_le_bytes());
    hasher.update(reason.code().as_bytes());
    for cell in row.cells() {
        hasher.update([0x1f]);
        hasher.update(cell.trim().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_round_trip() {
        for reason in [IncidentReason::NombreFaltante, IncidentReason::DeportistaAmbiguo] {
            assert_eq!(IncidentReason::from_code(reason.code()), Some(reason));
        }
        assert_eq!(IncidentReason::from_code("other"), None);
        assert_eq!(
            serde_json::to_string(&IncidentReason::DeportistaAmbiguo).unwrap(),
            r#""deportistaAmbiguo""#
        );
    }

    #[test]
    fn test_fingerprint_is_stable_for_same_content() {
        let competition = Uuid::new_v4();
        let a = ImportIncident::new(
            competition,
            1,
            RawRow::from(vec!["1", "", "Club"]),
            IncidentReason::NombreFaltante,
            vec![],
        );
        let b = ImportIncident::new(
            competition,
            1,
            RawRow::from(vec!["1", " ", "Club "]),
            IncidentReason::NombreFaltante,
            vec![],
        );

        assert_ne!(a.id, b.id);
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_identical_rows_at_different_positions_differ() {
        let competition = Uuid::new_v4();
        let row = RawRow::from(vec!["DNS", "", "Club Norte"]);
        let reason = IncidentReason::NombreFaltante;

        assert_ne!(
            incident_fingerprint(competition, 1, reason, &row),
            incident_fingerprint(competition, 2, reason, &row)
        );
    }

    #[test]
    fn test_fingerprint_separates_cells_reasons_and_competitions() {
        let competition = Uuid::new_v4();
        let joined = RawRow::from(vec!["a b"]);
        let split = RawRow::from(vec!["a", "b"]);
        let reason = IncidentReason::DeportistaAmbiguo;

        assert_ne!(
            incident_fingerprint(competition, 1, reason, &joined),
            incident_fingerprint(competition, 1, reason, &split)
        );
        assert_ne!(
            incident_fingerprint(competition, 1, reason, &split),
            incident_fingerprint(competition, 1, IncidentReason::NombreFaltante, &split)
        );
        assert_ne!(
            incident_fingerprint(competition, 1, reason, &split),
            incident_fingerprint(Uuid::new_v4(), 1, reason, &split)
        );
    }
}
