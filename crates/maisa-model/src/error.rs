use thiserror::Error;

/// An assembled entity that violates a model constraint.
///
/// Extraction drops the offending entity and reports this as a warning,
/// except for the patient profile, which a usable record cannot do without.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity}: invalid date '{value}' in {field}")]
    InvalidDate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{entity}: missing {field}")]
    MissingValue {
        entity: &'static str,
        field: &'static str,
    },
    #[error("{entity}: cannot parse numeric value '{value}'")]
    UnparsableNumber { entity: &'static str, value: String },
    #[error("{entity}: {message}")]
    Conflict {
        entity: &'static str,
        message: &'static str,
    },
    #[error("{entity}: unknown code system '{system}'")]
    UnknownCodeSystem { entity: &'static str, system: String },
}

pub type Result<T> = std::result::Result<T, ValidationError>;
