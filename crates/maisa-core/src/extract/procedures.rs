use maisa_ingest::{Element, XmlDocument};
use maisa_model::Procedure;

use super::{Extracted, original_text, point_in_time};
use crate::datetime::required_format;
use crate::error::Result;
use crate::sections::{self, find_section};

const DEFAULT_STATUS: &str = "completed";

/// Extracts procedures from section `47519-4`. Entries without a code are
/// skipped.
pub fn extract_procedures(doc: &XmlDocument) -> Result<Extracted<Procedure>> {
    let Some(section) = find_section(doc, sections::PROCEDURES)? else {
        return Ok(Extracted::default());
    };
    let mut extracted = Extracted::default();
    for procedure in section.select(".//v3:entry/v3:procedure")? {
        extracted.absorb(self::procedure(procedure))?;
    }
    Ok(extracted)
}

fn procedure(procedure: Element<'_>) -> Result<Option<Procedure>> {
    let Some(coded) = procedure.select_first("v3:code")? else {
        return Ok(None);
    };
    let Some(code) = coded.attr("code") else {
        return Ok(None);
    };

    let name = match coded.attr("displayName") {
        Some(name) => name.to_string(),
        None => original_text(coded)?.unwrap_or_else(|| code.to_string()),
    };

    Ok(Some(Procedure {
        code: code.to_string(),
        code_system: coded
            .attr("codeSystemName")
            .or_else(|| coded.attr("codeSystem"))
            .map(str::to_string),
        name,
        performed: required_format("procedure", "performed", point_in_time(procedure)?)?,
        status: procedure
            .select_attr("v3:statusCode", "code")?
            .unwrap_or(DEFAULT_STATUS)
            .to_string(),
    }))
}
