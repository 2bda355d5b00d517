use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, info_span};

use maisa_core::run_pipeline;
use maisa_ingest::discover_documents;
use maisa_model::{PrivacyLevel, ProcessingOptions};
use maisa_privacy::apply_privacy;
use maisa_report::{Envelope, write_json};

use crate::cli::Cli;
use crate::types::RunResult;

/// Converts one export folder into the JSON health record.
pub fn run(cli: &Cli) -> Result<RunResult> {
    let start = Instant::now();
    let privacy = PrivacyLevel::from(cli.privacy);
    let options = ProcessingOptions::new()
        .with_fail_fast(cli.fail_fast)
        .with_privacy(privacy);

    // =========================================================================
    // Stage 1: Discover
    // =========================================================================
    let documents = {
        let span = info_span!("discover", directory = %cli.directory.display());
        let _guard = span.enter();
        discover_documents(&cli.directory, &cli.summary_file)?
    };
    info!(documents = documents.narratives.len(), "documents discovered");

    // =========================================================================
    // Stage 2: Parse, extract, merge
    // =========================================================================
    let output = run_pipeline(&documents, &options)
        .with_context(|| format!("failed to process {}", cli.directory.display()))?;

    // =========================================================================
    // Stage 3: Redact and write
    // =========================================================================
    let record = apply_privacy(&output.record, options.privacy, options.now().date());
    write_json(&cli.output, &Envelope::new(&record, options.privacy, Utc::now()))?;

    info!(
        output = %cli.output.display(),
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );
    Ok(RunResult {
        output: cli.output.clone(),
        privacy,
        record,
        documents: output.documents,
        skipped: output.skipped,
        warnings: output.warnings,
    })
}
