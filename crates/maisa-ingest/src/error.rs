//! Error types for document ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering, reading or parsing documents.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory holds no `DOC*.XML` documents.
    #[error("no DOC*.XML documents found in {path}")]
    NoDocuments { path: PathBuf },

    /// Failed to read a document file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === XML Errors ===
    /// The document is not well-formed XML.
    #[error("{file}: malformed XML: {message}")]
    MalformedXml { file: String, message: String },

    /// A lookup expression could not be compiled.
    #[error("invalid path expression '{expr}': {message}")]
    InvalidPath { expr: String, message: String },
}

impl IngestError {
    /// Name of the document the failure belongs to, if any.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::MalformedXml { file, .. } => Some(file.clone()),
            Self::FileRead { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            _ => None,
        }
    }

    /// Whether this is a per-document failure that a run may skip over.
    pub fn is_document_failure(&self) -> bool {
        matches!(self, Self::MalformedXml { .. } | Self::FileRead { .. })
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::MalformedXml {
            file: "DOC0003.XML".to_string(),
            message: "unexpected end of document".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "DOC0003.XML: malformed XML: unexpected end of document"
        );
    }

    #[test]
    fn test_file_name_from_read_error() {
        let err = IngestError::FileRead {
            path: PathBuf::from("/export/DOC0002.XML"),
            source: std::io::Error::other("denied"),
        };
        assert_eq!(err.file_name().as_deref(), Some("DOC0002.XML"));
        assert!(err.is_document_failure());
        assert!(
            !IngestError::NoDocuments {
                path: PathBuf::from("/export"),
            }
            .is_document_failure()
        );
    }
}
