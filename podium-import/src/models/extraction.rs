//! Extraction sessions and the two-phase import protocol payloads
//!
//! `extract` stages an [`ExtractionSession`]; `confirm` reads it back with the
//! reviewer's mapping and writes results.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ColumnMapping, RawRow, RawTable};

/// Where the table text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    /// Text layer of the PDF
    Pdf,
    /// OCR fallback
    Ocr,
    /// Neither produced text
    None,
}

/// Server-side state bridging extract and confirm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSession {
    pub extraction_id: Uuid,
    pub competition_id: Uuid,
    pub file_reference: String,
    /// Hex SHA-256 of the source file
    pub source_hash: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub detected_columns: ColumnMapping,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ExtractionSession {
    /// Stage a new session with a fresh random identifier
    pub fn new(
        competition_id: Uuid,
        file_reference: String,
        source_hash: String,
        table: RawTable,
        detected_columns: ColumnMapping,
        ttl: std::time::Duration,
    ) -> Self {
        let created_at = Utc::now();
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(1));
        Self {
            extraction_id: Uuid::new_v4(),
            competition_id,
            file_reference,
            source_hash,
            headers: table.headers,
            rows: table.rows,
            detected_columns,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of `extract`, shown to the reviewer before confirming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub extraction_id: Uuid,
    pub headers: Vec<String>,
    pub detected_columns: ColumnMapping,
    pub rows_sample: Vec<RawRow>,
    pub rows_total: usize,
    /// Direct text extraction failed and OCR did not recover any text
    #[serde(rename = "requiresOCR")]
    pub requires_ocr: bool,
    pub text_source: TextSource,
    pub source_hash: String,
}

/// Input of `confirm`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub extraction_id: Uuid,
    pub competition_id: Uuid,
    /// Reviewer-confirmed mapping; may differ from the detected one
    pub column_mapping: ColumnMapping,
}

/// Result of `confirm`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Reserved; rows either become results or incidents
    pub skipped: usize,
    pub incidents: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(ttl_secs: u64) -> ExtractionSession {
        ExtractionSession::new(
            Uuid::new_v4(),
            "results.pdf".to_string(),
            "abc".to_string(),
            RawTable::default(),
            ColumnMapping::default(),
            std::time::Duration::from_secs(ttl_secs),
        )
    }

    #[test]
    fn test_new_sessions_get_distinct_ids() {
        assert_ne!(session(60).extraction_id, session(60).extraction_id);
    }

    #[test]
    fn test_expiry_boundary() {
        let s = session(60);
        assert!(!s.is_expired());
        assert!(!s.is_expired_at(s.created_at + Duration::seconds(59)));
        assert!(s.is_expired_at(s.created_at + Duration::seconds(60)));
    }

    #[test]
    fn test_summary_wire_names() {
        let summary = ExtractionSummary {
            extraction_id: Uuid::nil(),
            headers: vec![],
            detected_columns: ColumnMapping::default(),
            rows_sample: vec![],
            rows_total: 0,
            requires_ocr: true,
            text_source: TextSource::None,
            source_hash: String::new(),
        };
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["requiresOCR"], true);
        assert_eq!(json["rowsTotal"], 0);
        assert_eq!(json["textSource"], "none");
    }
}
