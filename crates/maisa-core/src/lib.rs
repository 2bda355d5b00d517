//! Extraction, merge and pipeline for Maisa/Apotti CDA exports.
//!
//! Turns a set of parsed CDA documents into one [`maisa_model::HealthRecord`]:
//! per-document section extraction, then a cross-document merge with
//! identity-key dedup and last-write-wins by clinical time.

pub mod datetime;
pub mod error;
pub mod extract;
pub mod merge;
pub mod pipeline;
pub mod sections;

pub use datetime::{
    normalize_birth_time, normalize_hl7, normalize_hl7_lenient, optional_format,
    parse_hl7_timestamp, required_format,
};
pub use error::{ExtractError, PipelineError, Result};
pub use extract::{
    DocumentExtraction, Extracted, SectionData, document_time, extract_allergies,
    extract_diagnoses, extract_document, extract_document_summary, extract_immunizations,
    extract_lab_results, extract_medications, extract_patient_profile, extract_procedures,
    extract_social_history,
};
pub use merge::{Accumulator, MergeOutput, Provenance, merge_extractions};
pub use pipeline::{PipelineOutput, run_pipeline};
