//! Error types for extraction and the processing pipeline.

use maisa_ingest::IngestError;
use maisa_model::ValidationError;
use thiserror::Error;

/// A recognized section whose shape contradicts the expected structure.
///
/// Scoped to one section of one document: the pipeline reports it as a
/// warning and carries on with the remaining sections.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{section} section: {message}")]
    Section {
        section: &'static str,
        message: String,
    },

    /// A single entity failed model validation; only that entity is dropped.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Xml(#[from] IngestError),
}

impl ExtractError {
    pub(crate) fn section(section: &'static str, message: impl Into<String>) -> Self {
        Self::Section {
            section,
            message: message.into(),
        }
    }
}

/// Failures that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A document could not be read or parsed and fail-fast is enabled.
    #[error(transparent)]
    Parse(#[from] IngestError),

    #[error("no document carries a patient profile (recordTarget/patientRole)")]
    MissingPatientProfile,

    #[error("invalid patient profile: {0}")]
    InvalidPatientProfile(#[source] ValidationError),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
