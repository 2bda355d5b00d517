//! Coding-system OIDs referenced by CDA `code`, `value` and `translation`
//! elements.

/// WHO Anatomical Therapeutic Chemical classification.
pub const ATC: &str = "2.16.840.1.113883.6.73";
/// WHO ICD-10.
pub const ICD10: &str = "2.16.840.1.113883.6.3";
/// ICD-10-CM.
pub const ICD10_CM: &str = "2.16.840.1.113883.6.90";
/// Finnish THL ICD-10 classification.
pub const ICD10_FI: &str = "1.2.246.537.6.1";
/// SNOMED CT.
pub const SNOMED_CT: &str = "2.16.840.1.113883.6.96";

/// Display name used for ATC translations in Apotti exports.
pub const ATC_SYSTEM_NAME: &str = "WHO ATC";
