//! Data models for the results import pipeline

pub mod column_mapping;
pub mod extraction;
pub mod incident;
pub mod result;
pub mod table;

pub use column_mapping::{ColumnMapping, Field};
pub use extraction::{ConfirmRequest, ConfirmSummary, ExtractionSession, ExtractionSummary, TextSource};
pub use incident::{incident_fingerprint, ImportIncident, IncidentReason};
pub use result::{AthleteRef, NormalizedRow, ResultKey, ResultRecord, SourceRef, UpsertOutcome};
pub use table::{RawRow, RawTable};
