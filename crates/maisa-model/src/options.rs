//! Configuration options for record processing.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How much personally identifying content survives in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    /// Identifiers, dates of birth, provider names and notes removed; dates
    /// generalized to year-month.
    Strict,
    /// Direct identifiers removed, date of birth replaced by age.
    #[default]
    Redacted,
    /// No redaction. Personal use only.
    Full,
}

impl PrivacyLevel {
    pub const ALL: [PrivacyLevel; 3] = [Self::Strict, Self::Redacted, Self::Full];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Redacted => "redacted",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown privacy level '{0}' (expected strict, redacted or full)")]
pub struct ParsePrivacyLevelError(pub String);

impl FromStr for PrivacyLevel {
    type Err = ParsePrivacyLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "redacted" => Ok(Self::Redacted),
            "full" => Ok(Self::Full),
            other => Err(ParsePrivacyLevelError(other.to_string())),
        }
    }
}

/// Options controlling a processing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// Abort the whole run on the first document that fails to parse.
    ///
    /// When false the document is skipped and a warning is recorded.
    pub fail_fast: bool,

    /// Redaction level applied before output.
    pub privacy: PrivacyLevel,

    /// Pins "now" for medication status and age computation. Local time
    /// when unset.
    pub reference_time: Option<NaiveDateTime>,
}

impl ProcessingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fail_fast(mut self, enable: bool) -> Self {
        self.fail_fast = enable;
        self
    }

    pub fn with_privacy(mut self, level: PrivacyLevel) -> Self {
        self.privacy = level;
        self
    }

    pub fn with_reference_time(mut self, now: NaiveDateTime) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// The processing time used for time-relative derivations.
    pub fn now(&self) -> NaiveDateTime {
        self.reference_time
            .unwrap_or_else(|| Local::now().naive_local())
    }
}
