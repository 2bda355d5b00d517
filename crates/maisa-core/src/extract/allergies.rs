//! Allergy section (`48765-2`).

use maisa_ingest::{Element, XmlDocument};
use maisa_model::{AllergyEntry, ValidationError};

use super::{Extracted, original_text};
use crate::error::Result;
use crate::sections::{self, find_section};

/// Extracts allergy statements.
///
/// A negated observation (`negationInd="true"`) anywhere in the section
/// means "no known allergies", and the section then yields exactly one
/// [`AllergyEntry::NoKnownAllergy`] whatever its other entries say.
pub fn extract_allergies(doc: &XmlDocument) -> Result<Extracted<AllergyEntry>> {
    let Some(section) = find_section(doc, sections::ALLERGIES)? else {
        return Ok(Extracted::default());
    };
    let observations =
        section.select(".//v3:entry/v3:act/v3:entryRelationship/v3:observation")?;

    if observations
        .iter()
        .any(|obs| obs.attr("negationInd").is_some_and(|v| v.eq_ignore_ascii_case("true")))
    {
        return Ok(Extracted::from_items(vec![AllergyEntry::NoKnownAllergy]));
    }

    let mut extracted = Extracted::default();
    for observation in observations {
        extracted.absorb(allergy(observation))?;
    }
    Ok(extracted)
}

fn allergy(observation: Element<'_>) -> Result<Option<AllergyEntry>> {
    match substance(observation)? {
        Some(substance) => Ok(Some(AllergyEntry::HasAllergy { substance })),
        None => Err(ValidationError::MissingValue {
            entity: "allergy",
            field: "substance",
        }
        .into()),
    }
}

/// The substance from the observation value, falling back to the
/// participant's playing entity.
fn substance(observation: Element<'_>) -> Result<Option<String>> {
    if let Some(value) = observation.select_first("v3:value")? {
        if let Some(name) = value.attr("displayName") {
            return Ok(Some(name.to_string()));
        }
        if value.attr("nullFlavor").is_none()
            && let Some(code) = value.attr("code")
        {
            return Ok(Some(code.to_string()));
        }
    }

    let Some(entity) =
        observation.select_first("v3:participant/v3:participantRole/v3:playingEntity")?
    else {
        return Ok(None);
    };
    if let Some(code) = entity.select_first("v3:code")? {
        if let Some(name) = code.attr("displayName") {
            return Ok(Some(name.to_string()));
        }
        if let Some(text) = original_text(code)? {
            return Ok(Some(text));
        }
    }
    Ok(entity
        .select_first("v3:name")?
        .map(|name| name.collapsed_text())
        .filter(|name| !name.is_empty()))
}
