//! Patient demographics from `recordTarget/patientRole`.

use maisa_ingest::{Element, XmlDocument, collapse_whitespace};
use maisa_model::PatientProfile;

use crate::datetime::normalize_birth_time;
use crate::error::Result;

/// Reads the first `patientRole`. `None` when the document has none.
pub fn extract_patient_profile(doc: &XmlDocument) -> Result<Option<PatientProfile>> {
    let Some(role) = doc.select_first("//v3:recordTarget/v3:patientRole")? else {
        return Ok(None);
    };

    let mut profile = PatientProfile {
        national_id: role.select_attr("v3:id", "extension")?.map(str::to_string),
        address: address(role)?,
        phone: telecom(role, "tel:")?,
        email: telecom(role, "mailto:")?,
        ..PatientProfile::default()
    };

    if let Some(patient) = role.select_first("v3:patient")? {
        profile.full_name = full_name(patient)?;
        profile.gender = patient
            .select_first("v3:administrativeGenderCode")?
            .and_then(|code| code.attr("displayName").or_else(|| code.attr("code")))
            .map(str::to_string);
        profile.dob = normalize_birth_time(patient.select_attr("v3:birthTime", "value")?);
    }

    Ok(Some(profile))
}

/// Legal name (`use="L"`) when present, otherwise the first name.
fn full_name(patient: Element<'_>) -> Result<Option<String>> {
    let name = match patient.select_first(r#"v3:name[@use="L"]"#)? {
        Some(name) => Some(name),
        None => patient.select_first("v3:name")?,
    };
    let Some(name) = name else {
        return Ok(None);
    };

    let mut parts = Vec::new();
    for part in name.select("v3:given")?.into_iter().chain(name.select("v3:family")?) {
        let text = part.collapsed_text();
        if !text.is_empty() {
            parts.push(text);
        }
    }
    if parts.is_empty() {
        // Unstructured name
        let text = name.collapsed_text();
        return Ok((!text.is_empty()).then_some(text));
    }
    Ok(Some(parts.join(" ")))
}

fn address(role: Element<'_>) -> Result<Option<String>> {
    let Some(addr) = role.select_first("v3:addr")? else {
        return Ok(None);
    };
    let parts: Vec<String> = addr
        .children()
        .map(|part| part.collapsed_text())
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() {
        let text = collapse_whitespace(&addr.text());
        return Ok((!text.is_empty()).then_some(text));
    }
    Ok(Some(parts.join(", ")))
}

fn telecom(role: Element<'_>, scheme: &str) -> Result<Option<String>> {
    Ok(role
        .select("v3:telecom")?
        .into_iter()
        .filter_map(|telecom| telecom.attr("value"))
        .find_map(|value| value.strip_prefix(scheme))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}
