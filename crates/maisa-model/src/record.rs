use serde::{Deserialize, Serialize};

use crate::clinical::{
    AllergyEntry, Diagnosis, Immunization, LabResult, MedicationEntry, MedicationStatus,
    Procedure, SocialHistoryEntry,
};
use crate::encounter::DocumentSummary;
use crate::patient::PatientProfile;

/// The consolidated record built from one export.
///
/// Clinical sequences keep first-seen order after dedup; `encounters` is
/// ordered by [`order_encounters`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub patient_profile: PatientProfile,
    pub allergies: Vec<AllergyEntry>,
    pub medications: Vec<MedicationEntry>,
    pub lab_results: Vec<LabResult>,
    pub diagnoses: Vec<Diagnosis>,
    pub procedures: Vec<Procedure>,
    pub immunizations: Vec<Immunization>,
    pub social_history: Vec<SocialHistoryEntry>,
    pub encounters: Vec<DocumentSummary>,
}

impl HealthRecord {
    pub fn active_medications(&self) -> impl Iterator<Item = &MedicationEntry> {
        self.medications
            .iter()
            .filter(|medication| medication.status == MedicationStatus::Active)
    }

    pub fn medication_history(&self) -> impl Iterator<Item = &MedicationEntry> {
        self.medications
            .iter()
            .filter(|medication| medication.status == MedicationStatus::Historical)
    }
}

/// Sorts encounters by timestamp ascending.
///
/// Entries without a parsable date go last and keep their relative order.
pub fn order_encounters(mut encounters: Vec<DocumentSummary>) -> Vec<DocumentSummary> {
    encounters.sort_by_cached_key(|encounter| {
        let timestamp = encounter.timestamp();
        (timestamp.is_none(), timestamp)
    });
    encounters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encounter(date: Option<&str>, source_file: &str) -> DocumentSummary {
        DocumentSummary {
            document_id: None,
            date: date.map(str::to_string),
            doc_type: "Hoitokertomus".to_string(),
            provider: None,
            notes: String::new(),
            source_file: source_file.to_string(),
        }
    }

    #[test]
    fn encounters_sort_ascending_with_undated_last() {
        let ordered = order_encounters(vec![
            encounter(None, "DOC0004.XML"),
            encounter(Some("2024-03-15T10:00:00"), "DOC0002.XML"),
            encounter(Some("garbage"), "DOC0005.XML"),
            encounter(Some("2023-11"), "DOC0003.XML"),
        ]);
        let files: Vec<&str> = ordered.iter().map(|e| e.source_file.as_str()).collect();
        assert_eq!(
            files,
            ["DOC0003.XML", "DOC0002.XML", "DOC0004.XML", "DOC0005.XML"]
        );
    }
}
