//! Import pipeline services
//!
//! Pure steps (normalizer, header mapper, table extractor) plus the
//! production adapters for the collaborator traits and the orchestrator
//! that ties them together.

pub mod file_source;
pub mod header_mapper;
pub mod ocr;
pub mod orchestrator;
pub mod pdf_text;
pub mod session_store;
pub mod table_extractor;
pub mod text_normalizer;

pub use file_source::{LocalFileSource, SourceKind};
pub use header_mapper::{HeaderMapper, SynonymTable};
pub use ocr::TesseractOcr;
pub use orchestrator::{Collaborators, ImportOrchestrator, OrchestratorSettings};
pub use pdf_text::LopdfTextExtractor;
pub use session_store::InMemorySessionStore;
pub use table_extractor::extract_table_from_text;
pub use text_normalizer::{normalize_name, normalize_number, normalize_row, normalize_time, Parsed};
