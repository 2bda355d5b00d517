//! CLI argument definitions for the Maisa parser.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use maisa_ingest::DEFAULT_SUMMARY_FILE;
use maisa_model::PrivacyLevel;

#[derive(Parser)]
#[command(
    name = "maisa",
    version,
    about = "Convert a Maisa/Apotti CDA export into one JSON health record",
    long_about = "Convert a Maisa/Apotti CDA export into one JSON health record.\n\n\
                  Reads every DOC*.XML document in the export folder, merges their \
                  sections into a single record and writes it as JSON.\n\
                  Identifiers are redacted by default; see --privacy."
)]
pub struct Cli {
    /// Export folder holding the DOC*.XML documents.
    #[arg(value_name = "DIRECTORY", default_value = ".")]
    pub directory: PathBuf,

    /// Output JSON file.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "patient_history.json"
    )]
    pub output: PathBuf,

    /// File name of the summary document inside the export folder.
    #[arg(long = "summary-file", value_name = "NAME", default_value = DEFAULT_SUMMARY_FILE)]
    pub summary_file: String,

    /// How much identifying content survives in the output.
    ///
    /// strict: identifiers, date of birth, provider names and notes removed,
    /// encounter dates generalized to year-month.
    /// redacted: identifiers removed, date of birth replaced by age.
    /// full: no redaction; the output must not leave your machine.
    #[arg(long = "privacy", value_enum, default_value = "redacted")]
    pub privacy: PrivacyArg,

    /// Abort on the first document that fails to parse.
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// CLI privacy level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum PrivacyArg {
    Strict,
    Redacted,
    Full,
}

impl From<PrivacyArg> for PrivacyLevel {
    fn from(arg: PrivacyArg) -> Self {
        match arg {
            PrivacyArg::Strict => PrivacyLevel::Strict,
            PrivacyArg::Redacted => PrivacyLevel::Redacted,
            PrivacyArg::Full => PrivacyLevel::Full,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
