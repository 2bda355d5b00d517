//! Diagnoses from the problem list section (`11450-4`).

use maisa_ingest::{Element, XmlDocument};
use maisa_model::{CodeSystem, Diagnosis, DiagnosisStatus, ValidationError};

use super::{Extracted, original_text};
use crate::datetime::required_format;
use crate::error::{ExtractError, Result};
use crate::sections::{self, find_section};

const SECTION: &str = "diagnoses";

/// Extracts diagnoses from active concern acts of the problem list.
///
/// The coded problem sits in `act/entryRelationship/observation/value`.
/// Its code system comes from the `codeSystem` OID, then from the
/// `codeSystemName`, then from a translation in a known system.
pub fn extract_diagnoses(doc: &XmlDocument) -> Result<Extracted<Diagnosis>> {
    let Some(section) = find_section(doc, sections::PROBLEMS)? else {
        return Ok(Extracted::default());
    };

    let mut extracted = Extracted::default();
    for act in section.select(".//v3:entry/v3:act")? {
        let active = act
            .select_attr("v3:statusCode", "code")?
            .is_some_and(|code| code.eq_ignore_ascii_case("active"));
        if !active {
            continue;
        }
        for observation in act.select("v3:entryRelationship/v3:observation")? {
            for value in observation.select(r#"v3:value[@xsi:type="CD"]"#)? {
                extracted.absorb(diagnosis(observation, value))?;
            }
        }
    }
    Ok(extracted)
}

fn diagnosis(observation: Element<'_>, value: Element<'_>) -> Result<Option<Diagnosis>> {
    let Some(code) = value.attr("code") else {
        if value.attr("nullFlavor").is_some() {
            return Ok(None);
        }
        return Err(ExtractError::section(
            SECTION,
            "problem value carries neither a code nor a nullFlavor",
        ));
    };

    let (code_system, code) = match classify(value) {
        Some(system) => (system, code.to_string()),
        None => match known_translation(value)? {
            Some(found) => found,
            None => {
                let system = value
                    .attr("codeSystem")
                    .or_else(|| value.attr("codeSystemName"))
                    .unwrap_or_default();
                return Err(ValidationError::UnknownCodeSystem {
                    entity: "diagnosis",
                    system: system.to_string(),
                }
                .into());
            }
        },
    };

    let display_name = match value.attr("displayName") {
        Some(name) => name.to_string(),
        None => original_text(value)?.unwrap_or_else(|| code.clone()),
    };

    let time = observation.select_first("v3:effectiveTime")?;
    let resolved = match time {
        Some(time) => time.select_attr("v3:high", "value")?.is_some(),
        None => false,
    };
    let onset = match time {
        Some(time) => time.select_attr("v3:low", "value")?,
        None => None,
    };

    Ok(Some(Diagnosis {
        code,
        code_system,
        display_name,
        status: if resolved {
            DiagnosisStatus::Resolved
        } else {
            DiagnosisStatus::Active
        },
        onset: required_format("diagnosis", "onset", onset)?,
    }))
}

fn classify(coded: Element<'_>) -> Option<CodeSystem> {
    coded
        .attr("codeSystem")
        .and_then(CodeSystem::from_oid)
        .or_else(|| coded.attr("codeSystemName").and_then(CodeSystem::from_name))
}

fn known_translation(value: Element<'_>) -> Result<Option<(CodeSystem, String)>> {
    Ok(value.select("v3:translation")?.into_iter().find_map(|translation| {
        let code = translation.attr("code")?;
        Some((classify(translation)?, code.to_string()))
    }))
}
