//! Section extractors.
//!
//! Each extractor maps one concern of a parsed CDA document to typed
//! entities. Extraction is tolerant: a missing section or element is an
//! empty result, never an error. Entities that fail model validation are
//! dropped and collected in [`Extracted::rejected`]; an unparsable optional
//! field is emptied and recorded in [`Extracted::cleared`]. A section whose
//! shape contradicts the expected structure fails as a whole with
//! [`ExtractError::Section`].
//!
//! | Concern | Source |
//! |---------|--------|
//! | Patient profile | `recordTarget/patientRole` |
//! | Allergies | section `48765-2` |
//! | Medications | `substanceAdministration` outside the immunization section |
//! | Lab results | observations with a `PQ` value |
//! | Diagnoses | active concern acts in section `11450-4` |
//! | Procedures | section `47519-4` |
//! | Immunizations | section `11369-6` |
//! | Social history | section `29762-2` |
//! | Document summary | header metadata and narrative section text |

mod allergies;
mod diagnoses;
mod document;
mod immunizations;
mod labs;
mod medications;
mod patient;
mod procedures;
mod social;

use chrono::NaiveDateTime;
use maisa_ingest::{Element, SourceDocument};
use maisa_model::{
    AllergyEntry, ClinicalTime, Diagnosis, DocumentSummary, Immunization, LabResult,
    MedicationEntry, PatientProfile, Procedure, SocialHistoryEntry, ValidationError, codes,
};
use tracing::{debug, info_span, warn};

use crate::error::{ExtractError, Result};

pub use allergies::extract_allergies;
pub use diagnoses::extract_diagnoses;
pub use document::{document_time, extract_document_summary};
pub use immunizations::extract_immunizations;
pub use labs::extract_lab_results;
pub use medications::extract_medications;
pub use patient::extract_patient_profile;
pub use procedures::extract_procedures;
pub use social::extract_social_history;

/// Entities extracted from one section, plus the ones validation dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub items: Vec<T>,
    pub rejected: Vec<ValidationError>,
    /// Fields of kept entities that were emptied because they did not parse.
    pub cleared: Vec<ValidationError>,
}

impl<T> Default for Extracted<T> {
    fn default() -> Self {
        Self::from_items(Vec::new())
    }
}

impl<T> Extracted<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            items,
            rejected: Vec::new(),
            cleared: Vec::new(),
        }
    }

    /// Like [`Extracted::absorb`] for entries that may empty unparsable
    /// fields. Cleared fields are only recorded when the entry is kept.
    pub(crate) fn absorb_lenient(
        &mut self,
        entry: impl FnOnce(&mut Vec<ValidationError>) -> Result<Option<T>>,
    ) -> Result<()> {
        let mut cleared = Vec::new();
        let outcome = entry(&mut cleared);
        if matches!(outcome, Ok(Some(_))) {
            self.cleared.append(&mut cleared);
        }
        self.absorb(outcome)
    }

    /// Files the outcome of one entry: kept, skipped, rejected, or fatal to
    /// the section.
    pub(crate) fn absorb(&mut self, outcome: Result<Option<T>>) -> Result<()> {
        match outcome {
            Ok(Some(item)) => self.items.push(item),
            Ok(None) => {}
            Err(ExtractError::Invalid(error)) => self.rejected.push(error),
            Err(error) => return Err(error),
        }
        Ok(())
    }
}

/// Structured entities of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionData {
    pub allergies: Vec<AllergyEntry>,
    pub medications: Vec<MedicationEntry>,
    pub lab_results: Vec<LabResult>,
    pub diagnoses: Vec<Diagnosis>,
    pub procedures: Vec<Procedure>,
    pub immunizations: Vec<Immunization>,
    pub social_history: Vec<SocialHistoryEntry>,
}

/// Everything extracted from one document, ready for merging.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentExtraction {
    pub source_file: String,
    /// Position of the document in file-name order.
    pub order: usize,
    pub fingerprint: String,
    /// Clinical time of the document, used for last-write-wins.
    pub document_time: Option<ClinicalTime>,
    pub profile: Option<PatientProfile>,
    pub sections: SectionData,
    pub summary: Option<DocumentSummary>,
    /// Section failures and rejected entities, already prefixed with the
    /// file name.
    pub warnings: Vec<String>,
}

/// Runs every extractor over one parsed document.
///
/// Failures stay local to the section that raised them and end up in
/// [`DocumentExtraction::warnings`].
pub fn extract_document(
    source: &SourceDocument,
    order: usize,
    now: NaiveDateTime,
) -> DocumentExtraction {
    let doc = &source.xml;
    let file = source.file_name.as_str();
    let span = info_span!("extract", source_file = %file);
    let _guard = span.enter();

    let mut warnings = Vec::new();
    let mut report = |section: &str, error: &dyn std::fmt::Display| {
        warn!(source_file = %file, section, %error, "extraction problem");
        warnings.push(format!("{file}: {section}: {error}"));
    };

    let profile = match extract_patient_profile(doc) {
        Ok(profile) => profile,
        Err(error) => {
            report("patient_profile", &error);
            None
        }
    };

    let mut sections = SectionData::default();
    macro_rules! run {
        ($field:ident, $name:literal, $call:expr) => {
            match $call {
                Ok(extracted) => {
                    for rejected in &extracted.rejected {
                        report($name, rejected);
                    }
                    for cleared in &extracted.cleared {
                        report($name, &format!("{cleared} (field left empty)"));
                    }
                    sections.$field = extracted.items;
                }
                Err(error) => report($name, &error),
            }
        };
    }
    run!(allergies, "allergies", extract_allergies(doc));
    run!(medications, "medications", extract_medications(doc, now));
    run!(lab_results, "lab_results", extract_lab_results(doc));
    run!(diagnoses, "diagnoses", extract_diagnoses(doc));
    run!(procedures, "procedures", extract_procedures(doc));
    run!(immunizations, "immunizations", extract_immunizations(doc));
    run!(social_history, "social_history", extract_social_history(doc));

    let summary = match extract_document_summary(doc) {
        Ok(summary) => summary,
        Err(error) => {
            report("document_summary", &error);
            None
        }
    };

    debug!(
        medications = sections.medications.len(),
        lab_results = sections.lab_results.len(),
        diagnoses = sections.diagnoses.len(),
        has_summary = summary.is_some(),
        "document extracted"
    );

    DocumentExtraction {
        source_file: file.to_string(),
        order,
        fingerprint: source.fingerprint.clone(),
        document_time: document_time(doc),
        profile,
        sections,
        summary,
        warnings,
    }
}

// === Shared lookups ===

/// The `@value` of an element's `effectiveTime`, or its `low/@value` when
/// the time is an interval.
pub(crate) fn point_in_time<'d>(element: Element<'d>) -> Result<Option<&'d str>> {
    let Some(time) = element.select_first("v3:effectiveTime")? else {
        return Ok(None);
    };
    if let Some(value) = time.attr("value") {
        return Ok(Some(value));
    }
    Ok(time.select_attr("v3:low", "value")?)
}

/// Text behind a coded element's `originalText`: the referenced narrative
/// when it carries a `reference`, otherwise its inline text.
pub(crate) fn original_text(coded: Element<'_>) -> Result<Option<String>> {
    let Some(original) = coded.select_first("v3:originalText")? else {
        return Ok(None);
    };
    if let Some(reference) = original.select_attr("v3:reference", "value")? {
        return Ok(coded.document().resolve_reference(reference));
    }
    let inline = original.collapsed_text();
    Ok((!inline.is_empty()).then_some(inline))
}

/// The ATC `translation` of a coded element, matched by code system OID or
/// by the `WHO ATC` system name.
pub(crate) fn atc_translation<'d>(coded: Element<'d>) -> Result<Option<Element<'d>>> {
    Ok(coded.select("v3:translation")?.into_iter().find(|t| {
        t.attr("codeSystem") == Some(codes::ATC)
            || t.attr("codeSystemName") == Some(codes::ATC_SYSTEM_NAME)
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use maisa_ingest::XmlDocument;

    /// Wraps section markup in a minimal CDA document.
    pub fn document(body: &str) -> XmlDocument {
        let text = format!(
            r#"<ClinicalDocument xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <component><structuredBody>{body}</structuredBody></component>
</ClinicalDocument>"#
        );
        XmlDocument::parse("DOC0001.XML", &text).unwrap()
    }
}
