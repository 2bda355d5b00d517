//! Processing pipeline with explicit stages.
//!
//! 1. **Parse**: read and parse every document (parallel)
//! 2. **Extract**: run the section extractors per document (parallel, same pass)
//! 3. **Merge**: fold the extractions into one record (sequential)
//!
//! Redaction and output are left to the caller.

use std::path::PathBuf;
use std::time::Instant;

use maisa_ingest::{DocumentSet, IngestError, read_document};
use maisa_model::{HealthRecord, ProcessingOptions};
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use crate::error::PipelineError;
use crate::extract::{DocumentExtraction, extract_document};
use crate::merge::merge_extractions;

/// Result of a run: the merged record and every non-fatal warning.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub record: HealthRecord,
    pub warnings: Vec<String>,
    /// Documents parsed and extracted.
    pub documents: usize,
    /// Documents skipped after a parse failure.
    pub skipped: usize,
}

/// Parses, extracts and merges every document of `documents`.
///
/// Each path is processed once; the summary is added in front when the
/// narrative list does not already hold it. Documents are read on the rayon
/// pool and merged afterwards in file order.
///
/// # Errors
///
/// With `fail_fast` set, the first document (in file order) that cannot be
/// read or parsed ends the run with [`PipelineError::Parse`]. Without it the
/// document is skipped with a warning naming it. Failures not tied to one
/// document, and a missing or invalid patient profile, are always fatal.
pub fn run_pipeline(
    documents: &DocumentSet,
    options: &ProcessingOptions,
) -> Result<PipelineOutput, PipelineError> {
    let start = Instant::now();
    let paths = document_paths(documents);
    let summary_file = documents
        .summary
        .as_deref()
        .and_then(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned());
    let now = options.now();

    let results: Vec<Result<DocumentExtraction, IngestError>> = {
        let span = info_span!("parse", documents = paths.len());
        let _guard = span.enter();
        paths
            .par_iter()
            .enumerate()
            .map(|(order, path)| {
                let source = read_document(path)?;
                Ok(extract_document(&source, order, now))
            })
            .collect()
    };

    let mut warnings = Vec::new();
    let mut extractions = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(extraction) => extractions.push(extraction),
            Err(error) if options.fail_fast || !error.is_document_failure() => {
                return Err(PipelineError::Parse(error));
            }
            Err(error) => {
                warn!(
                    source_file = error.file_name().as_deref().unwrap_or("<unknown>"),
                    %error,
                    "document skipped"
                );
                warnings.push(format!("{error} (document skipped)"));
            }
        }
    }
    let parsed = extractions.len();
    let skipped = paths.len() - parsed;

    let merged = merge_extractions(extractions, summary_file.as_deref())?;
    warnings.extend(merged.warnings);

    info!(
        documents = parsed,
        skipped,
        warnings = warnings.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "pipeline complete"
    );

    Ok(PipelineOutput {
        record: merged.record,
        warnings,
        documents: parsed,
        skipped,
    })
}

fn document_paths(documents: &DocumentSet) -> Vec<PathBuf> {
    let mut paths = documents.narratives.clone();
    if let Some(summary) = &documents.summary
        && !paths.contains(summary)
    {
        paths.insert(0, summary.clone());
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_prepended_once() {
        let set = DocumentSet {
            summary: Some(PathBuf::from("x/DOC0001.XML")),
            narratives: vec![PathBuf::from("x/DOC0002.XML")],
        };
        assert_eq!(
            document_paths(&set),
            [PathBuf::from("x/DOC0001.XML"), PathBuf::from("x/DOC0002.XML")]
        );

        let set = DocumentSet {
            summary: Some(PathBuf::from("x/DOC0001.XML")),
            narratives: vec![PathBuf::from("x/DOC0001.XML"), PathBuf::from("x/DOC0002.XML")],
        };
        assert_eq!(document_paths(&set).len(), 2);
    }
}
