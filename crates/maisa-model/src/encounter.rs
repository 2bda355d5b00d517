use serde::{Deserialize, Serialize};

use crate::time::ClinicalTime;

/// Default document type when a CDA document has no title.
pub const DEFAULT_DOCUMENT_TYPE: &str = "Clinical Document";

/// One narrative document ("encounter") of the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// `ClinicalDocument/id` as `root^extension`.
    pub document_id: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub provider: Option<String>,
    pub notes: String,
    pub source_file: String,
}

impl DocumentSummary {
    /// Parsed [`date`](Self::date), `None` when absent or unparsable.
    pub fn timestamp(&self) -> Option<ClinicalTime> {
        self.date.as_deref().and_then(ClinicalTime::parse_iso)
    }
}
