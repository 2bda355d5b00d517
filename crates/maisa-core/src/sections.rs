//! LOINC section codes and narrative section filtering.

use maisa_ingest::{Element, XmlDocument};

use crate::error::Result;

pub const ALLERGIES: &str = "48765-2";
pub const PROBLEMS: &str = "11450-4";
pub const PROCEDURES: &str = "47519-4";
pub const IMMUNIZATIONS: &str = "11369-6";
pub const SOCIAL_HISTORY: &str = "29762-2";
pub const MEDICATIONS: &str = "10160-0";
pub const RESULTS: &str = "30954-2";
pub const VITAL_SIGNS: &str = "8716-3";

/// Sections whose content the structured extractors understand.
pub const RECOGNIZED: [&str; 8] = [
    ALLERGIES,
    PROBLEMS,
    PROCEDURES,
    IMMUNIZATIONS,
    SOCIAL_HISTORY,
    MEDICATIONS,
    RESULTS,
    VITAL_SIGNS,
];

/// Narrative sections left out of encounter notes because their content is
/// already captured as structured entities. Matched as substrings of the
/// section title.
pub const EXCLUDED_NARRATIVE_TITLES: [&str; 25] = [
    "Lääkkeet",
    "Tulokset",
    "Rokotukset",
    "Allergiat",
    "Aktiiviset tarpeet/diagnoosit",
    "Viimeisimmät tallennetut peruselintoiminnot",
    "Hoito-ohjelma",
    "Käyntisyyt",
    "Palvelukontaktit",
    "Annetut lääkkeet",
    "Toimenpiteet",
    "Omatiimit",
    "Merkintä kohteesta Apotti",
    "Määrätyt reseptit",
    "Elintapahistoria",
    "Medications",
    "Results",
    "Immunizations",
    "Allergies",
    "Problem List",
    "Vitals",
    "Care Plan",
    "Encounters",
    "Procedures",
    "Care Teams",
];

/// First section carrying `code`, anywhere in the document.
pub fn find_section<'d>(doc: &'d XmlDocument, code: &str) -> Result<Option<Element<'d>>> {
    Ok(doc.select_first(&section_path(code))?)
}

/// Every section carrying `code`, in document order.
pub fn find_sections<'d>(doc: &'d XmlDocument, code: &str) -> Result<Vec<Element<'d>>> {
    Ok(doc.select(&section_path(code))?)
}

fn section_path(code: &str) -> String {
    format!(r#"//v3:section[v3:code[@code="{code}"]]"#)
}

/// Whether the document holds at least one section the extractors know.
pub fn has_recognized_section(doc: &XmlDocument) -> Result<bool> {
    for section in doc.select("//v3:section/v3:code")? {
        if section.attr("code").is_some_and(|code| RECOGNIZED.contains(&code)) {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn is_excluded_title(title: &str) -> bool {
    EXCLUDED_NARRATIVE_TITLES
        .iter()
        .any(|excluded| title.contains(excluded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_matches_title_prefixes() {
        assert!(is_excluded_title("Lääkkeet 15.3.2024"));
        assert!(is_excluded_title("Active Problem List"));
        assert!(!is_excluded_title("Käynnin syy"));
        assert!(!is_excluded_title(""));
    }

    #[test]
    fn finds_sections_by_code() {
        let doc = XmlDocument::parse(
            "DOC0001.XML",
            r#"<ClinicalDocument xmlns="urn:hl7-org:v3"><component><structuredBody>
                <component><section><code code="48765-2"/><title>Allergiat</title></section></component>
            </structuredBody></component></ClinicalDocument>"#,
        )
        .unwrap();
        assert!(find_section(&doc, ALLERGIES).unwrap().is_some());
        assert_eq!(find_sections(&doc, ALLERGIES).unwrap().len(), 1);
        assert!(find_sections(&doc, IMMUNIZATIONS).unwrap().is_empty());
        assert!(find_section(&doc, PROBLEMS).unwrap().is_none());
        assert!(has_recognized_section(&doc).unwrap());
    }
}
