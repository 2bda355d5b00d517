//! Document discovery for export folders.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{IngestError, Result};

/// Default name of the summary document in a Maisa export.
pub const DEFAULT_SUMMARY_FILE: &str = "DOC0001.XML";

/// The documents of one export, resolved to paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSet {
    /// The summary document, when present in the folder.
    pub summary: Option<PathBuf>,
    /// Every clinical document in file-name order, summary included.
    pub narratives: Vec<PathBuf>,
}

/// Lists all `DOC*.XML` files in a directory.
///
/// Matching is case-insensitive; `METADATA.XML` and other files are skipped.
/// Returns files sorted by filename.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();

        // Skip directories
        if !path.is_file() {
            continue;
        }

        if path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_clinical_document)
        {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Resolves the summary document and the narrative list of an export folder.
///
/// A missing summary is not an error here; the pipeline decides what a run
/// without one can still produce.
pub fn discover_documents(dir: &Path, summary_name: &str) -> Result<DocumentSet> {
    let narratives = list_documents(dir)?;
    if narratives.is_empty() {
        return Err(IngestError::NoDocuments {
            path: dir.to_path_buf(),
        });
    }

    let exact = dir.join(summary_name);
    let summary = if exact.is_file() {
        Some(exact)
    } else {
        narratives
            .iter()
            .find(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.eq_ignore_ascii_case(summary_name))
            })
            .cloned()
    };

    match &summary {
        Some(path) => debug!(summary = %path.display(), "summary document resolved"),
        None => warn!(summary_name, dir = %dir.display(), "summary document not found"),
    }

    Ok(DocumentSet {
        summary,
        narratives,
    })
}

fn is_clinical_document(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    upper.starts_with("DOC") && upper.ends_with(".XML")
}
