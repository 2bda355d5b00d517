//! HL7 v3 timestamp normalization.
//!
//! CDA `TS` values use the ISO 8601 basic format with optional fraction and
//! zone offset: `YYYYMMDDHHMMSS.fff+ZZZZ`, truncated from the right to the
//! recorded precision. Output is ISO 8601 extended form at the same
//! precision; the zone offset is dropped.
//!
//! | Input | Output |
//! |-------|--------|
//! | `20240315143000+0200` | `2024-03-15T14:30:00` |
//! | `202403151430` | `2024-03-15T14:30` |
//! | `2024031514` | `2024-03-15T14` |
//! | `20240315` | `2024-03-15` |
//! | `202403` | `2024-03` |
//! | `2024` | `2024` |

use maisa_model::{ClinicalTime, TimePrecision, ValidationError};

/// Parses an HL7 timestamp. Values already in ISO extended form are
/// accepted as-is.
pub fn parse_hl7_timestamp(value: &str) -> Option<ClinicalTime> {
    let value = value.trim();
    if value.len() > 4 && value.as_bytes()[4] == b'-' {
        return ClinicalTime::parse_iso(value);
    }

    let value = value
        .find(['+', '-', 'Z'])
        .map_or(value, |pos| &value[..pos]);
    let value = value.split_once('.').map_or(value, |(whole, _)| whole);
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let field = |range: std::ops::Range<usize>| -> Option<u32> {
        value.get(range).and_then(|part| part.parse().ok())
    };
    match value.len() {
        4 | 6 | 8 | 10 | 12 | 14 => {}
        _ => return None,
    }
    let year = value[..4].parse::<i32>().ok()?;
    ClinicalTime::from_parts(
        year,
        field(4..6),
        field(6..8),
        field(8..10),
        field(10..12),
        field(12..14),
    )
}

/// Strict normalization: `None` for absent, blank or unparsable values.
pub fn normalize_hl7(value: &str) -> Option<String> {
    parse_hl7_timestamp(value).map(|time| time.to_iso())
}

/// Tolerant normalization: unparsable values are kept verbatim (trimmed).
pub fn normalize_hl7_lenient(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    Some(normalize_hl7(value).unwrap_or_else(|| value.to_string()))
}

/// Normalizes a timestamp attribute that an entity depends on.
///
/// Absent stays absent; a present but unparsable value is a
/// [`ValidationError::InvalidDate`] for `entity.field`.
pub fn required_format(
    entity: &'static str,
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    normalize_hl7(raw)
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidDate {
            entity,
            field,
            value: raw.to_string(),
        })
}

/// Normalizes an optional timestamp attribute.
///
/// Unlike [`required_format`] the entity survives an unparsable value: the
/// field is left empty and the failure is recorded in `cleared`.
pub fn optional_format(
    entity: &'static str,
    field: &'static str,
    value: Option<&str>,
    cleared: &mut Vec<ValidationError>,
) -> Option<String> {
    required_format(entity, field, value).unwrap_or_else(|error| {
        cleared.push(error);
        None
    })
}

/// Birth times are reported at day precision at most.
pub fn normalize_birth_time(value: Option<&str>) -> Option<String> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    match parse_hl7_timestamp(raw) {
        Some(time) => Some(time.truncate(TimePrecision::Day).to_iso()),
        None => Some(raw.to_string()),
    }
}
