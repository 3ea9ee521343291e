//! Import Orchestrator
//!
//! Drives the two-phase results import:
//!
//! **Phase 1 (`extract`):** read the file, hash it, pull text from the PDF
//! (falling back to OCR), split it into a table, detect column mapping, and
//! stage everything as an extraction session for review.
//!
//! **Phase 2 (`confirm`):** apply the reviewer's mapping to every staged row,
//! resolve athletes, upsert results, and queue unresolvable rows as
//! incidents.
//!
//! File-level failures abort `extract`. Row-level problems never abort
//! `confirm`; persistence errors do, leaving already upserted rows in place
//! (a retry only updates them).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use podium_common::config::ImportConfig;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ImportError, ImportResult};
use crate::models::{
    ConfirmRequest, ConfirmSummary, ExtractionSession, ExtractionSummary, ImportIncident,
    IncidentReason, ResultRecord, SourceRef, TextSource, UpsertOutcome,
};
use crate::services::file_source::{content_hash, SourceKind};
use crate::services::header_mapper::HeaderMapper;
use crate::services::table_extractor::extract_table_from_text;
use crate::services::text_normalizer::normalize_row;
use crate::types::{
    AthleteDirectory, FileSource, IncidentStore, OcrEngine, PdfTextExtractor, ResultStore,
    SessionStore,
};

/// Tunables for [`ImportOrchestrator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Rows included in the extraction preview
    pub sample_rows: usize,
    pub max_file_bytes: u64,
    pub ocr_language: String,
    /// Drop the extraction session after a successful confirm
    pub consume_on_confirm: bool,
    pub session_ttl: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for OrchestratorSettings {
    fn from(config: &ImportConfig) -> Self {
        Self {
            sample_rows: config.sample_rows,
            max_file_bytes: config.max_file_bytes,
            ocr_language: config.ocr_language.clone(),
            consume_on_confirm: config.consume_on_confirm,
            session_ttl: config.session_ttl(),
        }
    }
}

/// External services used by the orchestrator
#[derive(Clone)]
pub struct Collaborators {
    pub files: Arc<dyn FileSource>,
    pub pdf: Arc<dyn PdfTextExtractor>,
    pub ocr: Arc<dyn OcrEngine>,
    pub athletes: Arc<dyn AthleteDirectory>,
    pub results: Arc<dyn ResultStore>,
    pub incidents: Arc<dyn IncidentStore>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Text recovered from a source document
#[derive(Debug)]
struct DocumentText {
    text: String,
    source: TextSource,
    requires_ocr: bool,
}

/// Two-phase results importer
pub struct ImportOrchestrator {
    services: Collaborators,
    mapper: HeaderMapper,
    settings: OrchestratorSettings,
}

impl ImportOrchestrator {
    /// Create an orchestrator using the production synonym table
    pub fn new(services: Collaborators, settings: OrchestratorSettings) -> Self {
        Self {
            services,
            mapper: HeaderMapper::default(),
            settings,
        }
    }

    /// Replace the header mapper (custom synonym tables)
    pub fn with_header_mapper(mut self, mapper: HeaderMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Phase 1: stage a results file for review
    ///
    /// # Errors
    /// - `FileUnreadable` / `FileTooLarge` when the file cannot be used; no
    ///   session is created
    /// - `Common` when the session cannot be stored
    ///
    /// A document without any recoverable text is not an error: the summary
    /// comes back empty with `requires_ocr` set.
    pub async fn extract(
        &self,
        file_path: &Path,
        competition_id: Uuid,
    ) -> ImportResult<ExtractionSummary> {
        let unreadable = |source| ImportError::FileUnreadable {
            path: file_path.to_path_buf(),
            source,
        };

        let size = self.services.files.size(file_path).await.map_err(unreadable)?;
        if size > self.settings.max_file_bytes {
            return Err(ImportError::FileTooLarge {
                path: file_path.to_path_buf(),
                size,
                limit: self.settings.max_file_bytes,
            });
        }

        let bytes: Arc<[u8]> = self.services.files.read(file_path).await.map_err(unreadable)?.into();
        let source_hash = content_hash(bytes.clone()).await?;

        let document = self.document_text(&bytes).await;
        let table = extract_table_from_text(&document.text);
        let detected_columns = self.mapper.map_headers(&table.headers);

        let headers = table.headers.clone();
        let rows_total = table.rows.len();
        let rows_sample = table
            .rows
            .iter()
            .take(self.settings.sample_rows)
            .cloned()
            .collect();

        let session = ExtractionSession::new(
            competition_id,
            file_path.display().to_string(),
            source_hash.clone(),
            table,
            detected_columns,
            self.settings.session_ttl,
        );
        let extraction_id = self.services.sessions.create(session).await?;

        info!(
            extraction_id = %extraction_id,
            competition_id = %competition_id,
            file = %file_path.display(),
            rows = rows_total,
            text_source = ?document.source,
            requires_ocr = document.requires_ocr,
            "Extraction staged"
        );

        Ok(ExtractionSummary {
            extraction_id,
            headers,
            detected_columns,
            rows_sample,
            rows_total,
            requires_ocr: document.requires_ocr,
            text_source: document.source,
            source_hash,
        })
    }

    /// Phase 2: import the staged rows with a reviewer-confirmed mapping
    ///
    /// Rows are processed in order. Each one either upserts a result keyed
    /// by `(competition, athlete, category)` or becomes an incident.
    ///
    /// With `consume_on_confirm` the session is claimed before any row is
    /// written, so of two concurrent confirms only one imports. It is put
    /// back if the import fails.
    ///
    /// # Errors
    /// - `ExtractionNotFound` for unknown, expired or already confirmed ids
    /// - `CompetitionMismatch` when the session was staged for another
    ///   competition (nothing is written, the session is kept)
    /// - `Common` on persistence failure
    pub async fn confirm(&self, request: ConfirmRequest) -> ImportResult<ConfirmSummary> {
        let extraction_id = request.extraction_id;
        let session = self.staged(extraction_id).await?;

        if session.competition_id != request.competition_id {
            return Err(ImportError::CompetitionMismatch {
                extraction_id,
                expected: session.competition_id,
                actual: request.competition_id,
            });
        }

        let session = if self.settings.consume_on_confirm {
            self.services
                .sessions
                .consume(extraction_id)
                .await?
                .ok_or(ImportError::ExtractionNotFound(extraction_id))?
        } else {
            session
        };

        let summary = match self.import_rows(&request, &session).await {
            Ok(summary) => summary,
            Err(e) => {
                if self.settings.consume_on_confirm {
                    self.restore(session).await;
                }
                return Err(e);
            }
        };

        info!(
            extraction_id = %extraction_id,
            competition_id = %request.competition_id,
            inserted = summary.inserted,
            updated = summary.updated,
            incidents = summary.incidents,
            "Extraction confirmed"
        );

        Ok(summary)
    }

    async fn import_rows(
        &self,
        request: &ConfirmRequest,
        session: &ExtractionSession,
    ) -> ImportResult<ConfirmSummary> {
        let competition_id = request.competition_id;
        let source = SourceRef {
            file: session.file_reference.clone(),
            hash: session.source_hash.clone(),
        };
        let mut summary = ConfirmSummary::default();
        let mut incidents = Vec::new();

        for (index, row) in session.rows.iter().enumerate() {
            let row_number = index + 1;
            let normalized = normalize_row(row, &request.column_mapping);

            if normalized.nombre.is_empty() {
                debug!(row = row_number, "Row without athlete name");
                incidents.push(ImportIncident::new(
                    competition_id,
                    row_number,
                    row.clone(),
                    IncidentReason::NombreFaltante,
                    Vec::new(),
                ));
                continue;
            }

            let candidates = self
                .services
                .athletes
                .find_by_full_name(&normalized.nombre)
                .await?;
            let athlete = match candidates.as_slice() {
                [athlete] => athlete,
                _ => {
                    debug!(
                        row = row_number,
                        nombre = %normalized.nombre,
                        candidates = candidates.len(),
                        "Athlete not uniquely resolved"
                    );
                    incidents.push(ImportIncident::new(
                        competition_id,
                        row_number,
                        row.clone(),
                        IncidentReason::DeportistaAmbiguo,
                        candidates.iter().map(|a| a.id).collect(),
                    ));
                    continue;
                }
            };

            let record = ResultRecord::from_row(competition_id, athlete, &normalized, source.clone());
            match self.services.results.upsert(&record).await? {
                UpsertOutcome::Inserted => summary.inserted += 1,
                UpsertOutcome::Updated => summary.updated += 1,
            }
        }

        summary.incidents = incidents.len();
        if !incidents.is_empty() {
            let written = self.services.incidents.insert_many(&incidents).await?;
            if written < incidents.len() {
                debug!(
                    extraction_id = %session.extraction_id,
                    duplicates = incidents.len() - written,
                    "Incidents already queued from an earlier import"
                );
            }
        }

        Ok(summary)
    }

    /// Put a claimed session back after a failed import
    async fn restore(&self, session: ExtractionSession) {
        let extraction_id = session.extraction_id;
        if let Err(e) = self.services.sessions.create(session).await {
            warn!(
                extraction_id = %extraction_id,
                error = %e,
                "Failed to restore extraction session after failed confirm"
            );
        }
    }

    /// A staged extraction, as stored by `extract`
    ///
    /// # Errors
    /// `ExtractionNotFound` for unknown, expired or already confirmed ids
    pub async fn staged(&self, extraction_id: Uuid) -> ImportResult<ExtractionSession> {
        self.services
            .sessions
            .get(extraction_id)
            .await?
            .ok_or(ImportError::ExtractionNotFound(extraction_id))
    }

    /// Incidents queued for a competition, oldest first
    pub async fn get_incidencias(&self, competition_id: Uuid) -> ImportResult<Vec<ImportIncident>> {
        Ok(self.services.incidents.list_for_competition(competition_id).await?)
    }

    /// Stored results of a competition, by category then position
    pub async fn get_results(&self, competition_id: Uuid) -> ImportResult<Vec<ResultRecord>> {
        Ok(self.services.results.list_for_competition(competition_id).await?)
    }

    /// Evict expired extraction sessions
    pub async fn purge_expired_sessions(&self) -> ImportResult<usize> {
        Ok(self.services.sessions.purge_expired().await?)
    }

    /// Text layer first, OCR when the PDF yields nothing
    async fn document_text(&self, bytes: &[u8]) -> DocumentText {
        if SourceKind::sniff(bytes) == SourceKind::Image {
            debug!("Source is an image, skipping PDF text extraction");
        } else {
            match self.services.pdf.extract_text(bytes).await {
                Ok(text) if !text.trim().is_empty() => {
                    return DocumentText {
                        text,
                        source: TextSource::Pdf,
                        requires_ocr: false,
                    };
                }
                Ok(_) => debug!("PDF has no text layer"),
                Err(e) => warn!(error = %e, "PDF text extraction failed"),
            }
        }

        match self
            .services
            .ocr
            .recognize(bytes, &self.settings.ocr_language)
            .await
        {
            Ok(text) if !text.trim().is_empty() => DocumentText {
                text,
                source: TextSource::Ocr,
                requires_ocr: false,
            },
            Ok(_) => {
                warn!("OCR recognized no text");
                DocumentText::unreadable()
            }
            Err(e) => {
                warn!(error = %e, "OCR failed");
                DocumentText::unreadable()
            }
        }
    }
}

impl DocumentText {
    fn unreadable() -> Self {
        Self {
            text: String::new(),
            source: TextSource::None,
            requires_ocr: true,
        }
    }
}
