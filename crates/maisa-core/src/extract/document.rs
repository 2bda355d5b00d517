//! Document-level metadata and narrative notes ("encounters").

use maisa_ingest::{Element, XmlDocument};
use maisa_model::{ClinicalTime, DocumentSummary, encounter::DEFAULT_DOCUMENT_TYPE};

use crate::datetime::{normalize_hl7_lenient, parse_hl7_timestamp};
use crate::error::Result;
use crate::sections::{has_recognized_section, is_excluded_title};

const SERVICE_EVENT_START: &str =
    "/v3:ClinicalDocument/v3:documentationOf/v3:serviceEvent/v3:effectiveTime/v3:low";
const HEADER_TIME: &str = "/v3:ClinicalDocument/v3:effectiveTime";

/// Builds the encounter summary of one document.
///
/// Notes are one `"<section title>: <text>"` line per narrative section,
/// skipping sections whose title names a structured list. A document with
/// no notes and no recognized structured section yields `None`.
pub fn extract_document_summary(doc: &XmlDocument) -> Result<Option<DocumentSummary>> {
    let notes = notes(doc)?;
    if notes.is_empty() && !has_recognized_section(doc)? {
        return Ok(None);
    }

    let title = doc
        .select_first("/v3:ClinicalDocument/v3:title")?
        .map(|title| title.collapsed_text())
        .filter(|title| !title.is_empty());

    Ok(Some(DocumentSummary {
        document_id: document_id(doc)?,
        date: normalize_hl7_lenient(raw_document_time(doc)?),
        doc_type: title.unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string()),
        provider: provider(doc)?,
        notes,
        source_file: doc.file_name().to_string(),
    }))
}

/// Clinical time of the document: the service event start, else the
/// header `effectiveTime`. `None` when neither parses.
pub fn document_time(doc: &XmlDocument) -> Option<ClinicalTime> {
    raw_document_time(doc).ok().flatten().and_then(parse_hl7_timestamp)
}

fn raw_document_time(doc: &XmlDocument) -> Result<Option<&str>> {
    for expr in [SERVICE_EVENT_START, HEADER_TIME] {
        if let Some(value) = doc.select_first(expr)?.and_then(|time| time.attr("value")) {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// `root^extension`, or the bare root when the id has no extension.
fn document_id(doc: &XmlDocument) -> Result<Option<String>> {
    let Some(id) = doc.select_first("/v3:ClinicalDocument/v3:id")? else {
        return Ok(None);
    };
    Ok(match (id.attr("root"), id.attr("extension")) {
        (Some(root), Some(extension)) => Some(format!("{root}^{extension}")),
        (Some(root), None) => Some(root.to_string()),
        (None, Some(extension)) => Some(extension.to_string()),
        (None, None) => None,
    })
}

fn provider(doc: &XmlDocument) -> Result<Option<String>> {
    if let Some(name) = doc.select_first("//v3:author/v3:assignedAuthor/v3:assignedPerson/v3:name")? {
        let joined = joined_fragments(name);
        if !joined.is_empty() {
            return Ok(Some(joined));
        }
    }
    Ok(doc
        .select_first("//v3:author/v3:assignedAuthor/v3:representedOrganization/v3:name")?
        .map(|name| name.collapsed_text())
        .filter(|name| !name.is_empty()))
}

fn joined_fragments(element: Element<'_>) -> String {
    element
        .text_fragments()
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn notes(doc: &XmlDocument) -> Result<String> {
    let Some(body) = doc.select_first("//v3:component/v3:structuredBody")? else {
        return Ok(String::new());
    };

    let mut lines = Vec::new();
    for section in body.select(".//v3:section")? {
        let title = section
            .select_first("v3:title")?
            .map(|title| title.collapsed_text())
            .unwrap_or_default();
        if is_excluded_title(&title) {
            continue;
        }
        let Some(text) = section.select_first("v3:text")? else {
            continue;
        };
        let text = text.collapsed_text();
        if !text.is_empty() {
            lines.push(format!("{title}: {text}"));
        }
    }
    Ok(lines.join("\n"))
}
