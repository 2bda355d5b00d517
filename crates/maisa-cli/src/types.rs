use std::path::PathBuf;

use maisa_model::{HealthRecord, PrivacyLevel};

/// Outcome of a successful run, as shown in the summary.
#[derive(Debug)]
pub struct RunResult {
    pub output: PathBuf,
    pub privacy: PrivacyLevel,
    /// The record as written, after redaction.
    pub record: HealthRecord,
    pub documents: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
}
