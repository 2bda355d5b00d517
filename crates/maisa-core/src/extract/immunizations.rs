//! Vaccinations from section `11369-6`.

use maisa_ingest::{Element, XmlDocument};
use maisa_model::Immunization;

use super::{Extracted, atc_translation, original_text, point_in_time};
use crate::datetime::required_format;
use crate::error::Result;
use crate::sections::{self, find_section};

const DEFAULT_STATUS: &str = "completed";

pub fn extract_immunizations(doc: &XmlDocument) -> Result<Extracted<Immunization>> {
    let Some(section) = find_section(doc, sections::IMMUNIZATIONS)? else {
        return Ok(Extracted::default());
    };
    let mut extracted = Extracted::default();
    for administration in section.select(".//v3:entry/v3:substanceAdministration")? {
        extracted.absorb(immunization(administration))?;
    }
    Ok(extracted)
}

fn immunization(administration: Element<'_>) -> Result<Option<Immunization>> {
    let Some(material) = administration
        .select_first(".//v3:manufacturedProduct/v3:manufacturedMaterial/v3:code")?
    else {
        return Ok(None);
    };

    let translation = atc_translation(material)?;
    let vaccine_code = translation
        .and_then(|t| t.attr("code"))
        .or_else(|| material.attr("code"))
        .map(str::to_string);

    let name = match material.attr("displayName") {
        Some(name) => Some(name.to_string()),
        None => original_text(material)?
            .or_else(|| translation.and_then(|t| t.attr("displayName")).map(str::to_string)),
    };
    let Some(vaccine_name) = name.or_else(|| vaccine_code.clone()) else {
        return Ok(None);
    };

    Ok(Some(Immunization {
        vaccine_name,
        vaccine_code,
        administered: required_format(
            "immunization",
            "administered",
            point_in_time(administration)?,
        )?,
        status: administration
            .select_attr("v3:statusCode", "code")?
            .unwrap_or(DEFAULT_STATUS)
            .to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::document;

    fn section(entries: &str) -> String {
        format!(
            r#"<component><section><code code="11369-6"/><title>Rokotukset</title>{entries}</section></component>"#
        )
    }

    #[test]
    fn prefers_atc_translation_code() {
        let body = section(
            r#"<entry><substanceAdministration moodCode="EVN">
                <statusCode code="completed"/>
                <effectiveTime value="20211020"/>
                <consumable><manufacturedProduct><manufacturedMaterial>
                    <code code="JC-1" codeSystem="1.2.246.537.6.1001" displayName="Comirnaty">
                        <translation code="J07BX03" codeSystem="2.16.840.1.113883.6.73" displayName="covid-19-rokote"/>
                    </code>
                </manufacturedMaterial></manufacturedProduct></consumable>
            </substanceAdministration></entry>"#,
        );
        let extracted = extract_immunizations(&document(&body)).unwrap();
        assert_eq!(
            extracted.items,
            vec![Immunization {
                vaccine_name: "Comirnaty".to_string(),
                vaccine_code: Some("J07BX03".to_string()),
                administered: Some("2021-10-20".to_string()),
                status: "completed".to_string(),
            }]
        );
    }

    #[test]
    fn translation_name_fills_in_and_empty_material_is_skipped() {
        let body = section(
            r#"<entry><substanceAdministration><consumable><manufacturedProduct><manufacturedMaterial>
                <code nullFlavor="OTH"><translation code="J07AM51" codeSystemName="WHO ATC" displayName="jäykkäkouristus-kurkkumätärokote"/></code>
            </manufacturedMaterial></manufacturedProduct></consumable></substanceAdministration></entry>
            <entry><substanceAdministration><consumable><manufacturedProduct><manufacturedMaterial>
                <code nullFlavor="UNK"/>
            </manufacturedMaterial></manufacturedProduct></consumable></substanceAdministration></entry>"#,
        );
        let extracted = extract_immunizations(&document(&body)).unwrap();
        assert_eq!(extracted.items.len(), 1);
        assert_eq!(
            extracted.items[0].vaccine_name,
            "jäykkäkouristus-kurkkumätärokote"
        );
        assert_eq!(extracted.items[0].status, "completed");
    }
}
