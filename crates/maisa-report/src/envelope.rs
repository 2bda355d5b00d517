use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use maisa_model::{HealthRecord, PrivacyLevel};
use serde::Serialize;
use tracing::info;

use crate::error::{ReportError, Result};

/// Version of the output layout.
pub const SCHEMA_VERSION: &str = "1.0.0";
/// Tool name recorded in `_generator`.
pub const GENERATOR_NAME: &str = "maisa-parser";

/// Top-level JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<'a> {
    #[serde(rename = "_schema_version")]
    pub schema_version: &'static str,
    #[serde(rename = "_privacy_level")]
    pub privacy_level: PrivacyLevel,
    /// UTC, RFC 3339 with a `Z` suffix.
    #[serde(rename = "_generated_at")]
    pub generated_at: String,
    #[serde(rename = "_generator")]
    pub generator: String,
    pub health_record: &'a HealthRecord,
}

impl<'a> Envelope<'a> {
    pub fn new(
        record: &'a HealthRecord,
        privacy_level: PrivacyLevel,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            privacy_level,
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            generator: format!("{GENERATOR_NAME}/{}", env!("CARGO_PKG_VERSION")),
            health_record: record,
        }
    }
}

/// Pretty-printed JSON with a trailing newline.
pub fn render_json(envelope: &Envelope<'_>) -> Result<String> {
    let json = serde_json::to_string_pretty(envelope)?;
    Ok(format!("{json}\n"))
}

/// Writes the envelope to `path`, creating missing parent directories.
pub fn write_json(path: &Path, envelope: &Envelope<'_>) -> Result<()> {
    let json = render_json(envelope)?;
    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, json).map_err(write_error)?;
    info!(
        output = %path.display(),
        privacy_level = %envelope.privacy_level,
        "health record written"
    );
    Ok(())
}
