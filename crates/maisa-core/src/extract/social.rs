//! Social history (`29762-2`): tobacco, alcohol and other lifestyle
//! observations.

use maisa_ingest::{Element, XmlDocument};
use maisa_model::{SocialCategory, SocialHistoryEntry};

use super::Extracted;
use crate::error::Result;
use crate::sections::{self, find_section};

/// LOINC codes for tobacco use and smoking status.
const TOBACCO_CODES: [&str; 2] = ["72166-2", "11367-0"];
/// LOINC code for alcohol intake.
const ALCOHOL_CODES: [&str; 1] = ["11331-6"];

pub fn extract_social_history(doc: &XmlDocument) -> Result<Extracted<SocialHistoryEntry>> {
    let Some(section) = find_section(doc, sections::SOCIAL_HISTORY)? else {
        return Ok(Extracted::default());
    };
    let mut extracted = Extracted::default();
    for observation in section.select(".//v3:observation")? {
        extracted.absorb(entry(observation))?;
    }
    Ok(extracted)
}

fn entry(observation: Element<'_>) -> Result<Option<SocialHistoryEntry>> {
    let Some(code) = observation.select_first("v3:code")? else {
        return Ok(None);
    };
    let Some(label) = code.attr("displayName").or_else(|| code.attr("code")) else {
        return Ok(None);
    };

    let status = match observation.select_first("v3:value")? {
        Some(value) => value
            .attr("displayName")
            .map(str::to_string)
            .or_else(|| Some(value.collapsed_text()).filter(|text| !text.is_empty()))
            .or_else(|| value.attr("code").map(str::to_string)),
        None => None,
    };

    Ok(Some(SocialHistoryEntry {
        category: categorize(code.attr("code"), label),
        label: label.to_string(),
        status,
    }))
}

fn categorize(code: Option<&str>, label: &str) -> SocialCategory {
    let label = label.to_lowercase();
    if code.is_some_and(|code| TOBACCO_CODES.contains(&code))
        || label.contains("tobacco")
        || label.contains("smok")
    {
        SocialCategory::Tobacco
    } else if code.is_some_and(|code| ALCOHOL_CODES.contains(&code)) || label.contains("alcohol")
    {
        SocialCategory::Alcohol
    } else {
        SocialCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::document;

    #[test]
    fn categorizes_observations() {
        let body = r#"<component><section><code code="29762-2"/>
            <entry><observation><code code="72166-2" displayName="Tupakointi"/><value xsi:type="CD" code="266919005" displayName="Ei ole koskaan tupakoinut"/></observation></entry>
            <entry><observation><code code="11331-6"/><value xsi:type="ST">2 annosta viikossa</value></observation></entry>
            <entry><observation><code code="X-1" displayName="Liikunta"/></observation></entry>
        </section></component>"#;
        let extracted = extract_social_history(&document(body)).unwrap();
        assert_eq!(
            extracted.items,
            vec![
                SocialHistoryEntry {
                    category: SocialCategory::Tobacco,
                    label: "Tupakointi".to_string(),
                    status: Some("Ei ole koskaan tupakoinut".to_string()),
                },
                SocialHistoryEntry {
                    category: SocialCategory::Alcohol,
                    label: "11331-6".to_string(),
                    status: Some("2 annosta viikossa".to_string()),
                },
                SocialHistoryEntry {
                    category: SocialCategory::Other,
                    label: "Liikunta".to_string(),
                    status: None,
                },
            ]
        );
    }

    #[test]
    fn label_keywords_categorize_uncoded_observations() {
        assert_eq!(categorize(None, "Smoking status"), SocialCategory::Tobacco);
        assert_eq!(categorize(None, "Alcohol use"), SocialCategory::Alcohol);
        assert_eq!(categorize(Some("1234-5"), "Ruokavalio"), SocialCategory::Other);
    }
}
