//! Numeric lab results and vitals.

use maisa_ingest::{Element, XmlDocument};
use maisa_model::{LabResult, ValidationError};

use super::{Extracted, original_text, point_in_time};
use crate::datetime::optional_format;
use crate::error::Result;

/// Extracts every observation with a physical quantity (`xsi:type="PQ"`)
/// value. Coded and text results are skipped silently. A result whose
/// timestamp does not parse is kept without one.
pub fn extract_lab_results(doc: &XmlDocument) -> Result<Extracted<LabResult>> {
    let mut extracted = Extracted::default();
    for observation in doc.select(r#"//v3:observation[v3:value[@xsi:type="PQ"]]"#)? {
        extracted.absorb_lenient(|cleared| lab_result(observation, cleared))?;
    }
    Ok(extracted)
}

fn lab_result(
    observation: Element<'_>,
    cleared: &mut Vec<ValidationError>,
) -> Result<Option<LabResult>> {
    let Some(value) = observation.select_first(r#"v3:value[@xsi:type="PQ"]"#)? else {
        return Ok(None);
    };
    let code = observation.select_first("v3:code")?;

    let test_name = match code {
        Some(code) => match code.attr("displayName") {
            Some(name) => Some(name.to_string()),
            None => original_text(code)?.or_else(|| code.attr("code").map(str::to_string)),
        },
        None => None,
    };
    let Some(test_name) = test_name else {
        return Err(ValidationError::MissingValue {
            entity: "lab_result",
            field: "test_name",
        }
        .into());
    };

    let Some(raw) = value.attr("value") else {
        return Err(ValidationError::MissingValue {
            entity: "lab_result",
            field: "value",
        }
        .into());
    };
    let number = parse_number(raw).ok_or_else(|| ValidationError::UnparsableNumber {
        entity: "lab_result",
        value: raw.to_string(),
    })?;

    Ok(Some(LabResult {
        test_name,
        code: code.and_then(|code| code.attr("code")).map(str::to_string),
        value: number,
        unit: value.attr("unit").map(str::to_string),
        interpretation: observation
            .select_attr("v3:interpretationCode", "code")?
            .map(interpretation),
        reference_range: reference_range(observation)?,
        timestamp: optional_format(
            "lab_result",
            "timestamp",
            point_in_time(observation)?,
            cleared,
        ),
    }))
}

/// Decimal value; Finnish exports occasionally use a decimal comma.
fn parse_number(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn interpretation(code: &str) -> String {
    match code {
        "H" => "High",
        "L" => "Low",
        "A" => "Abnormal",
        "N" => "Normal",
        other => other,
    }
    .to_string()
}

/// Range text, or `low–high unit` from the range's `IVL_PQ` value.
fn reference_range(observation: Element<'_>) -> Result<Option<String>> {
    let Some(range) = observation.select_first("v3:referenceRange/v3:observationRange")? else {
        return Ok(None);
    };
    if let Some(text) = range.select_first("v3:text")? {
        let text = text.collapsed_text();
        if !text.is_empty() {
            return Ok(Some(text));
        }
    }

    let low = range.select_first("v3:value/v3:low")?;
    let high = range.select_first("v3:value/v3:high")?;
    let unit = low
        .or(high)
        .and_then(|e| e.attr("unit"))
        .filter(|unit| *unit != "1");

    let span = match (bound(low), bound(high)) {
        (Some(low), Some(high)) => format!("{low}–{high}"),
        (Some(low), None) => format!(">= {low}"),
        (None, Some(high)) => format!("<= {high}"),
        (None, None) => return Ok(None),
    };
    Ok(Some(match unit {
        Some(unit) => format!("{span} {unit}"),
        None => span,
    }))
}

fn bound<'d>(element: Option<Element<'d>>) -> Option<&'d str> {
    element.and_then(|e| e.attr("value"))
}
