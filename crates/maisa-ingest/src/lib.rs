//! Document ingestion for Maisa/Apotti CDA exports.
//!
//! Finds `DOC*.XML` files in an export folder, reads them, and exposes each
//! as a namespace-aware XML tree with path lookups bound to the HL7 v3 and
//! XML Schema instance namespaces.

pub mod discovery;
pub mod document;
pub mod error;
pub mod xml;

// === Discovery ===
pub use discovery::{DEFAULT_SUMMARY_FILE, DocumentSet, discover_documents, list_documents};

// === Documents ===
pub use document::{SourceDocument, fingerprint, parse_document, read_document};

// === Errors ===
pub use error::{IngestError, Result};

// === XML ===
pub use xml::{Element, HL7_V3_NS, NAMESPACES, PathExpr, XSI_NS, XmlDocument, collapse_whitespace};
