//! Medications from `substanceAdministration` entries.

use chrono::NaiveDateTime;
use maisa_ingest::{Element, XmlDocument};
use maisa_model::{ClinicalTime, MedicationEntry, MedicationStatus, ValidationError};

use super::{Extracted, atc_translation, original_text};
use crate::datetime::{optional_format, parse_hl7_timestamp};
use crate::error::Result;
use crate::sections::{self, find_sections};

/// `effectiveTime` types that describe a dosing schedule, not a period.
const SCHEDULE_TYPES: [&str; 2] = ["PIVL_TS", "EIVL_TS"];

/// Extracts every medication administration in the document.
///
/// Administrations inside an immunization section are vaccines and are
/// left to [`super::extract_immunizations`]. A medication whose stop time
/// lies before `now` is historical; everything else is active. An entry
/// with neither a code nor a name is rejected on its own.
pub fn extract_medications(
    doc: &XmlDocument,
    now: NaiveDateTime,
) -> Result<Extracted<MedicationEntry>> {
    let immunizations = find_sections(doc, sections::IMMUNIZATIONS)?;
    let now = ClinicalTime::from_datetime(now);

    let mut extracted = Extracted::default();
    for administration in doc.select("//v3:substanceAdministration")? {
        if immunizations
            .iter()
            .any(|section| section.contains(administration))
        {
            continue;
        }
        extracted.absorb_lenient(|cleared| medication(administration, now, cleared))?;
    }
    Ok(extracted)
}

fn medication(
    administration: Element<'_>,
    now: ClinicalTime,
    cleared: &mut Vec<ValidationError>,
) -> Result<Option<MedicationEntry>> {
    let Some(material) = administration
        .select_first(".//v3:manufacturedProduct/v3:manufacturedMaterial/v3:code")?
    else {
        return Ok(None);
    };

    let translation = atc_translation(material)?;
    let code = translation
        .and_then(|t| t.attr("code"))
        .or_else(|| material.attr("code"))
        .map(str::to_string);

    let name = match original_text(material)? {
        Some(text) => Some(text),
        None => material
            .attr("displayName")
            .or_else(|| translation.and_then(|t| t.attr("displayName")))
            .map(str::to_string),
    };
    let name = match (name, &code) {
        (Some(name), _) => name,
        (None, Some(code)) => code.clone(),
        (None, None) => {
            return Err(ValidationError::MissingValue {
                entity: "medication",
                field: "name",
            }
            .into());
        }
    };

    let (start, stop) = period(administration)?;
    let start = optional_format("medication", "start", start, cleared);
    let stop_time = stop.and_then(parse_hl7_timestamp);
    let stop = optional_format("medication", "stop", stop, cleared);
    let status = match stop_time {
        Some(stop) if now.truncate(stop.precision()) > stop => MedicationStatus::Historical,
        _ => MedicationStatus::Active,
    };

    Ok(Some(MedicationEntry {
        name,
        code,
        dose: dose(administration)?,
        route: administration
            .select_first("v3:routeCode")?
            .and_then(|route| route.attr("displayName").or_else(|| route.attr("code")))
            .map(str::to_string),
        start,
        stop,
        status,
    }))
}

/// Start and stop from the first `effectiveTime` that is not a dosing
/// schedule.
fn period<'d>(administration: Element<'d>) -> Result<(Option<&'d str>, Option<&'d str>)> {
    let Some(time) = administration
        .select("v3:effectiveTime")?
        .into_iter()
        .find(|time| {
            time.attr("xsi:type")
                .is_none_or(|kind| !SCHEDULE_TYPES.contains(&kind))
        })
    else {
        return Ok((None, None));
    };

    let low = time.select_attr("v3:low", "value")?;
    let high = time.select_attr("v3:high", "value")?;
    Ok((low.or_else(|| time.attr("value")), high))
}

/// Dose text from the narrative the entry points to, or the structured
/// `doseQuantity`.
fn dose(administration: Element<'_>) -> Result<Option<String>> {
    if let Some(reference) = administration.select_attr("v3:text/v3:reference", "value")?
        && let Some(text) = administration.document().resolve_reference(reference)
    {
        return Ok(Some(text));
    }
    let Some(quantity) = administration.select_first("v3:doseQuantity")? else {
        return Ok(None);
    };
    let dose = match (quantity.attr("value"), quantity.attr("unit")) {
        (Some(value), Some(unit)) if unit != "1" => format!("{value} {unit}"),
        (Some(value), _) => value.to_string(),
        (None, _) => return Ok(None),
    };
    Ok(Some(dose))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::document;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn administration(inner: &str) -> String {
        format!(
            r#"<component><section><code code="10160-0"/>
            <text><content ID="med1">Burana 400 mg tabletti</content><content ID="sig1">1 tabl 3 kertaa päivässä</content></text>
            <entry><substanceAdministration>{inner}</substanceAdministration></entry>
            </section></component>"#
        )
    }

    const MATERIAL: &str = r##"<consumable><manufacturedProduct><manufacturedMaterial>
        <code code="123456" codeSystem="1.2.246.537.6.55" displayName="BURANA">
          <originalText><reference value="#med1"/></originalText>
          <translation code="M01AE01" codeSystem="2.16.840.1.113883.6.73" codeSystemName="WHO ATC" displayName="ibuprofeeni"/>
        </code>
    </manufacturedMaterial></manufacturedProduct></consumable>"##;

    #[test]
    fn reads_atc_code_name_and_dose() {
        let body = administration(&format!(
            r##"<text><reference value="#sig1"/></text>
            <effectiveTime xsi:type="IVL_TS"><low value="20240110"/></effectiveTime>
            <effectiveTime xsi:type="PIVL_TS"><period value="8" unit="h"/></effectiveTime>
            <routeCode code="PO" displayName="Suun kautta"/>
            {MATERIAL}"##
        ));
        let extracted = extract_medications(&document(&body), now()).unwrap();
        assert_eq!(
            extracted.items,
            vec![MedicationEntry {
                name: "Burana 400 mg tabletti".to_string(),
                code: Some("M01AE01".to_string()),
                dose: Some("1 tabl 3 kertaa päivässä".to_string()),
                route: Some("Suun kautta".to_string()),
                start: Some("2024-01-10".to_string()),
                stop: None,
                status: MedicationStatus::Active,
            }]
        );
    }

    #[test]
    fn past_stop_time_is_historical() {
        let body = administration(&format!(
            r#"<effectiveTime><low value="20230101"/><high value="20230201"/></effectiveTime>
            <doseQuantity value="2" unit="tabl"/>
            {MATERIAL}"#
        ));
        let medication = &extract_medications(&document(&body), now()).unwrap().items[0];
        assert_eq!(medication.status, MedicationStatus::Historical);
        assert_eq!(medication.stop.as_deref(), Some("2023-02-01"));
        assert_eq!(medication.dose.as_deref(), Some("2 tabl"));
    }

    #[test]
    fn stop_later_today_stays_active() {
        let body = administration(&format!(
            r#"<effectiveTime><low value="20240101"/><high value="20240601"/></effectiveTime>{MATERIAL}"#
        ));
        let medication = &extract_medications(&document(&body), now()).unwrap().items[0];
        assert_eq!(medication.status, MedicationStatus::Active);
    }

    #[test]
    fn primary_code_without_translation() {
        let body = administration(
            r#"<consumable><manufacturedProduct><manufacturedMaterial>
                <code code="N02BE01" displayName="Panadol"/>
            </manufacturedMaterial></manufacturedProduct></consumable>"#,
        );
        let medication = &extract_medications(&document(&body), now()).unwrap().items[0];
        assert_eq!(medication.code.as_deref(), Some("N02BE01"));
        assert_eq!(medication.name, "Panadol");
    }

    const UNCODED_MATERIAL: &str = r#"<consumable><manufacturedProduct><manufacturedMaterial>
        <code nullFlavor="UNK"/>
    </manufacturedMaterial></manufacturedProduct></consumable>"#;

    #[test]
    fn uncoded_unnamed_material_is_rejected() {
        let body = administration(UNCODED_MATERIAL);
        let extracted = extract_medications(&document(&body), now()).unwrap();
        assert!(extracted.items.is_empty());
        assert_eq!(
            extracted.rejected,
            vec![ValidationError::MissingValue {
                entity: "medication",
                field: "name",
            }]
        );
    }

    #[test]
    fn uncoded_material_leaves_its_neighbours_alone() {
        let body = format!(
            r#"<component><section><code code="10160-0"/>
            <text><content ID="med1">Burana 400 mg tabletti</content></text>
            <entry><substanceAdministration>{MATERIAL}</substanceAdministration></entry>
            <entry><substanceAdministration>{UNCODED_MATERIAL}</substanceAdministration></entry>
            <entry><substanceAdministration><consumable><manufacturedProduct><manufacturedMaterial>
                <code code="N02BE01" displayName="Panadol"/>
            </manufacturedMaterial></manufacturedProduct></consumable></substanceAdministration></entry>
            </section></component>"#
        );
        let extracted = extract_medications(&document(&body), now()).unwrap();
        let names: Vec<_> = extracted.items.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Burana 400 mg tabletti", "Panadol"]);
        assert_eq!(extracted.rejected.len(), 1);
    }

    #[test]
    fn unparsable_start_is_left_empty() {
        let body = administration(&format!(
            r#"<effectiveTime><low value="2024XX01"/><high value="20240301"/></effectiveTime>{MATERIAL}"#
        ));
        let extracted = extract_medications(&document(&body), now()).unwrap();
        assert!(extracted.rejected.is_empty());
        assert_eq!(extracted.items.len(), 1);
        assert_eq!(extracted.items[0].start, None);
        assert_eq!(extracted.items[0].stop.as_deref(), Some("2024-03-01"));
        assert_eq!(
            extracted.cleared,
            vec![ValidationError::InvalidDate {
                entity: "medication",
                field: "start",
                value: "2024XX01".to_string(),
            }]
        );
    }

    #[test]
    fn unparsable_stop_keeps_the_medication_active() {
        let body = administration(&format!(
            r#"<effectiveTime><low value="20230101"/><high value="garbage"/></effectiveTime>{MATERIAL}"#
        ));
        let extracted = extract_medications(&document(&body), now()).unwrap();
        let medication = &extracted.items[0];
        assert_eq!(medication.stop, None);
        assert_eq!(medication.status, MedicationStatus::Active);
        assert_eq!(extracted.cleared.len(), 1);
    }

    #[test]
    fn event_related_schedules_are_not_periods() {
        let body = administration(&format!(
            r#"<effectiveTime xsi:type="EIVL_TS"><event code="ACM"/></effectiveTime>
            <effectiveTime xsi:type="IVL_TS"><low value="20240201"/></effectiveTime>
            {MATERIAL}"#
        ));
        let medication = &extract_medications(&document(&body), now()).unwrap().items[0];
        assert_eq!(medication.start.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn vaccines_are_not_medications() {
        let body = format!(
            r#"<component><section><code code="11369-6"/>
            <entry><substanceAdministration>{MATERIAL}</substanceAdministration></entry>
            </section></component>"#
        );
        let extracted = extract_medications(&document(&body), now()).unwrap();
        assert!(extracted.items.is_empty());
    }

    #[test]
    fn every_immunization_section_is_excluded() {
        let vaccines = format!(
            r#"<component><section><code code="11369-6"/>
            <entry><substanceAdministration>{MATERIAL}</substanceAdministration></entry>
            </section></component>"#
        );
        let body = format!("{vaccines}{vaccines}");
        let extracted = extract_medications(&document(&body), now()).unwrap();
        assert!(extracted.items.is_empty());
    }
}
