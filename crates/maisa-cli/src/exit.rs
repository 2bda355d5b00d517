//! Process exit codes.

use maisa_core::PipelineError;
use maisa_ingest::IngestError;
use maisa_report::ReportError;

pub const SUCCESS: i32 = 0;
pub const UNEXPECTED: i32 = 1;
/// Missing export folder or no documents in it.
pub const INPUT: i32 = 2;
/// A document failed to parse under `--fail-fast`.
pub const PARSE: i32 = 3;
/// No usable patient profile.
pub const EXTRACTION: i32 = 4;
pub const OUTPUT: i32 = 5;

/// Maps the first typed error in the chain to its exit code.
pub fn code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(err) = cause.downcast_ref::<IngestError>() {
            return ingest_code(err);
        }
        if let Some(err) = cause.downcast_ref::<PipelineError>() {
            return match err {
                PipelineError::Parse(inner) => ingest_code(inner),
                PipelineError::MissingPatientProfile | PipelineError::InvalidPatientProfile(_) => {
                    EXTRACTION
                }
            };
        }
        if cause.downcast_ref::<ReportError>().is_some() {
            return OUTPUT;
        }
    }
    UNEXPECTED
}

fn ingest_code(error: &IngestError) -> i32 {
    match error {
        IngestError::DirectoryNotFound { .. }
        | IngestError::DirectoryRead { .. }
        | IngestError::NoDocuments { .. } => INPUT,
        IngestError::FileRead { .. } | IngestError::MalformedXml { .. } => PARSE,
        IngestError::InvalidPath { .. } => UNEXPECTED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::path::PathBuf;

    fn malformed() -> IngestError {
        IngestError::MalformedXml {
            file: "DOC0002.XML".to_string(),
            message: "unexpected end of document".to_string(),
        }
    }

    #[test]
    fn input_errors() {
        let err = anyhow::Error::from(IngestError::DirectoryNotFound {
            path: PathBuf::from("missing"),
        });
        assert_eq!(code_for(&err), INPUT);
    }

    #[test]
    fn pipeline_errors_behind_context() {
        let parse: anyhow::Result<()> = Err(PipelineError::Parse(malformed())).context("failed");
        assert_eq!(code_for(&parse.unwrap_err()), PARSE);

        let profile: anyhow::Result<()> =
            Err(PipelineError::MissingPatientProfile).context("failed");
        assert_eq!(code_for(&profile.unwrap_err()), EXTRACTION);
    }

    #[test]
    fn output_and_unknown_errors() {
        let write = anyhow::Error::from(ReportError::Write {
            path: PathBuf::from("out.json"),
            source: std::io::Error::other("read-only"),
        });
        assert_eq!(code_for(&write), OUTPUT);
        assert_eq!(code_for(&anyhow::anyhow!("boom")), UNEXPECTED);
    }
}
