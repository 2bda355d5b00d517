//! Structured clinical entities extracted from CDA sections.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codes;

/// Whether a medication is still being taken at processing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationStatus {
    Active,
    Historical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    /// ATC code when the export carries one, otherwise the primary code.
    pub code: Option<String>,
    pub dose: Option<String>,
    pub route: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub status: MedicationStatus,
}

/// A numeric (physical quantity) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub test_name: String,
    pub code: Option<String>,
    pub value: f64,
    pub unit: Option<String>,
    pub interpretation: Option<String>,
    pub reference_range: Option<String>,
    pub timestamp: Option<String>,
}

/// Coding scheme of a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeSystem {
    #[serde(rename = "ICD-10")]
    Icd10,
    #[serde(rename = "SNOMED")]
    Snomed,
}

impl CodeSystem {
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid.trim() {
            codes::ICD10 | codes::ICD10_CM | codes::ICD10_FI => Some(Self::Icd10),
            codes::SNOMED_CT => Some(Self::Snomed),
            _ => None,
        }
    }

    /// Falls back to the free-text `codeSystemName` some exports carry
    /// instead of (or next to) a known OID.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        if upper.contains("ICD") {
            Some(Self::Icd10)
        } else if upper.contains("SNOMED") {
            Some(Self::Snomed)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Icd10 => "ICD-10",
            Self::Snomed => "SNOMED",
        }
    }
}

impl fmt::Display for CodeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisStatus {
    Active,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub code: String,
    pub code_system: CodeSystem,
    pub display_name: String,
    pub status: DiagnosisStatus,
    pub onset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    /// National procedure code.
    pub code: String,
    pub code_system: Option<String>,
    pub name: String,
    pub performed: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Immunization {
    pub vaccine_name: String,
    /// ATC code when available.
    pub vaccine_code: Option<String>,
    pub administered: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialCategory {
    Tobacco,
    Alcohol,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialHistoryEntry {
    pub category: SocialCategory,
    /// Display name of the observation, e.g. "Tobacco smoking status".
    pub label: String,
    /// Observed status text, e.g. "Never smoker".
    pub status: Option<String>,
}

/// One allergy statement.
///
/// "No known allergies" is its own variant rather than an entry with an
/// empty substance, so consumers have to handle it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AllergyEntry {
    HasAllergy { substance: String },
    NoKnownAllergy,
}

impl AllergyEntry {
    pub fn substance(&self) -> Option<&str> {
        match self {
            Self::HasAllergy { substance } => Some(substance),
            Self::NoKnownAllergy => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_system_from_oid() {
        assert_eq!(CodeSystem::from_oid(codes::ICD10_FI), Some(CodeSystem::Icd10));
        assert_eq!(CodeSystem::from_oid(codes::SNOMED_CT), Some(CodeSystem::Snomed));
        assert_eq!(CodeSystem::from_oid("2.16.840.1.113883.6.1"), None);
    }

    #[test]
    fn code_system_from_name() {
        assert_eq!(CodeSystem::from_name("ICD-10-FI"), Some(CodeSystem::Icd10));
        assert_eq!(CodeSystem::from_name("SNOMED CT"), Some(CodeSystem::Snomed));
        assert_eq!(CodeSystem::from_name("LOINC"), None);
    }

    #[test]
    fn allergy_substance_accessor() {
        let allergy = AllergyEntry::HasAllergy {
            substance: "Penicillin".to_string(),
        };
        assert_eq!(allergy.substance(), Some("Penicillin"));
        assert_eq!(AllergyEntry::NoKnownAllergy.substance(), None);
    }
}
