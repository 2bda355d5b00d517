//! Health record model for Maisa/Apotti CDA exports.
//!
//! Every entity here is produced once by extraction and never updated in
//! place; redaction builds a new [`HealthRecord`] from an old one.

pub mod clinical;
pub mod codes;
pub mod encounter;
pub mod error;
pub mod identity;
pub mod options;
pub mod patient;
pub mod record;
pub mod time;

pub use clinical::{
    AllergyEntry, CodeSystem, Diagnosis, DiagnosisStatus, Immunization, LabResult,
    MedicationEntry, MedicationStatus, Procedure, SocialCategory, SocialHistoryEntry,
};
pub use encounter::DocumentSummary;
pub use error::{Result, ValidationError};
pub use identity::Identity;
pub use options::{ParsePrivacyLevelError, PrivacyLevel, ProcessingOptions};
pub use patient::PatientProfile;
pub use record::{HealthRecord, order_encounters};
pub use time::{ClinicalTime, TimePrecision};
