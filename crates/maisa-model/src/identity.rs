//! Dedup identity keys.
//!
//! Two entities with the same key describe the same real-world fact, even
//! when they came from different documents and differ in free text.

use std::hash::Hash;

use crate::clinical::{
    AllergyEntry, CodeSystem, Diagnosis, Immunization, LabResult, MedicationEntry, Procedure,
    SocialCategory, SocialHistoryEntry,
};

pub trait Identity {
    type Key: Eq + Hash + Clone;

    fn identity(&self) -> Self::Key;
}

impl Identity for MedicationEntry {
    /// (code, start, dose); the name stands in for a missing code.
    type Key = (String, Option<String>, Option<String>);

    fn identity(&self) -> Self::Key {
        let code = self.code.clone().unwrap_or_else(|| self.name.to_lowercase());
        (code, self.start.clone(), self.dose.clone())
    }
}

impl Identity for LabResult {
    type Key = (String, Option<String>);

    fn identity(&self) -> Self::Key {
        let code = self
            .code
            .clone()
            .unwrap_or_else(|| self.test_name.to_lowercase());
        (code, self.timestamp.clone())
    }
}

impl Identity for Diagnosis {
    type Key = (CodeSystem, String);

    fn identity(&self) -> Self::Key {
        (self.code_system, self.code.clone())
    }
}

impl Identity for Procedure {
    type Key = (String, Option<String>);

    fn identity(&self) -> Self::Key {
        (self.code.clone(), self.performed.clone())
    }
}

impl Identity for Immunization {
    type Key = (String, Option<String>);

    fn identity(&self) -> Self::Key {
        let code = self
            .vaccine_code
            .clone()
            .unwrap_or_else(|| self.vaccine_name.to_lowercase());
        (code, self.administered.clone())
    }
}

impl Identity for AllergyEntry {
    type Key = Option<String>;

    fn identity(&self) -> Self::Key {
        self.substance().map(str::to_lowercase)
    }
}

impl Identity for SocialHistoryEntry {
    type Key = (SocialCategory, String);

    fn identity(&self) -> Self::Key {
        (self.category, self.label.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MedicationStatus;

    fn medication(name: &str, code: Option<&str>) -> MedicationEntry {
        MedicationEntry {
            name: name.to_string(),
            code: code.map(str::to_string),
            dose: Some("1 tabl 3 kertaa päivässä".to_string()),
            route: None,
            start: Some("2024-01-10".to_string()),
            stop: None,
            status: MedicationStatus::Active,
        }
    }

    #[test]
    fn medication_key_ignores_display_name() {
        let a = medication("Burana 400 mg", Some("M01AE01"));
        let b = medication("Ibuprofen", Some("M01AE01"));
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn medication_without_code_falls_back_to_name() {
        let a = medication("Burana", None);
        let b = medication("Panadol", None);
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn allergy_keys_are_case_insensitive() {
        let a = AllergyEntry::HasAllergy {
            substance: "Penicillin".to_string(),
        };
        let b = AllergyEntry::HasAllergy {
            substance: "PENICILLIN".to_string(),
        };
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), AllergyEntry::NoKnownAllergy.identity());
    }
}
