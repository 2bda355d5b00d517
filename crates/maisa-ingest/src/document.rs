//! Reading and fingerprinting source documents.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::xml::XmlDocument;

/// One parsed CDA document together with where it came from.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub file_name: String,
    /// Hex SHA-256 of the raw bytes.
    pub fingerprint: String,
    pub xml: XmlDocument,
}

/// Reads and parses one document from disk.
pub fn read_document(path: &Path) -> Result<SourceDocument> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let mut document = parse_document(&file_name, &bytes)?;
    document.path = path.to_path_buf();
    debug!(
        source_file = %document.file_name,
        bytes = bytes.len(),
        "document parsed"
    );
    Ok(document)
}

/// Parses an in-memory document. The path is the bare file name.
pub fn parse_document(file_name: &str, bytes: &[u8]) -> Result<SourceDocument> {
    let text = std::str::from_utf8(bytes).map_err(|e| IngestError::MalformedXml {
        file: file_name.to_string(),
        message: format!("invalid UTF-8: {e}"),
    })?;
    let xml = XmlDocument::parse(file_name, text)?;

    Ok(SourceDocument {
        path: PathBuf::from(file_name),
        file_name: file_name.to_string(),
        fingerprint: fingerprint(bytes),
        xml,
    })
}

/// Hex SHA-256 digest of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
