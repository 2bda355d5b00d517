//! Tests for maisa-model types.

use maisa_model::{
    AllergyEntry, CodeSystem, Diagnosis, DiagnosisStatus, DocumentSummary, HealthRecord,
    MedicationEntry, MedicationStatus, PatientProfile, PrivacyLevel,
};

fn medication(name: &str, status: MedicationStatus) -> MedicationEntry {
    MedicationEntry {
        name: name.to_string(),
        code: None,
        dose: None,
        route: None,
        start: None,
        stop: None,
        status,
    }
}

#[test]
fn allergy_serializes_as_tagged_status() {
    let known = serde_json::to_value(AllergyEntry::HasAllergy {
        substance: "Pähkinä".to_string(),
    })
    .unwrap();
    assert_eq!(
        known,
        serde_json::json!({"status": "has-allergy", "substance": "Pähkinä"})
    );

    let none = serde_json::to_value(AllergyEntry::NoKnownAllergy).unwrap();
    assert_eq!(none, serde_json::json!({"status": "no-known-allergy"}));
}

#[test]
fn document_summary_serializes_type_field() {
    let summary = DocumentSummary {
        document_id: Some("1.2.246^123".to_string()),
        date: Some("2024-03-15".to_string()),
        doc_type: "Hoitokertomus".to_string(),
        provider: Some("Dr. House".to_string()),
        notes: "Käynnin syy: leg pain".to_string(),
        source_file: "DOC0002.XML".to_string(),
    };
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["type"], "Hoitokertomus");
    assert_eq!(value["date"], "2024-03-15");
    assert!(value.get("doc_type").is_none());
}

#[test]
fn diagnosis_code_system_serializes_display_form() {
    let diagnosis = Diagnosis {
        code: "J45.9".to_string(),
        code_system: CodeSystem::Icd10,
        display_name: "Astma".to_string(),
        status: DiagnosisStatus::Active,
        onset: None,
    };
    let value = serde_json::to_value(&diagnosis).unwrap();
    assert_eq!(value["code_system"], "ICD-10");
    assert_eq!(value["status"], "active");
}

#[test]
fn record_splits_active_and_historical_medications() {
    let record = HealthRecord {
        medications: vec![
            medication("Burana", MedicationStatus::Active),
            medication("Amoxin", MedicationStatus::Historical),
            medication("Panadol", MedicationStatus::Active),
        ],
        ..HealthRecord::default()
    };
    let active: Vec<&str> = record.active_medications().map(|m| m.name.as_str()).collect();
    let history: Vec<&str> = record
        .medication_history()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(active, ["Burana", "Panadol"]);
    assert_eq!(history, ["Amoxin"]);
}

#[test]
fn record_round_trips_through_json() {
    let record = HealthRecord {
        patient_profile: PatientProfile {
            full_name: Some("Matti Meikäläinen".to_string()),
            dob: Some("1990-01-01".to_string()),
            ..PatientProfile::default()
        },
        allergies: vec![AllergyEntry::NoKnownAllergy],
        ..HealthRecord::default()
    };
    let json = serde_json::to_string(&record).expect("serialize record");
    let round: HealthRecord = serde_json::from_str(&json).expect("deserialize record");
    assert_eq!(round, record);
}

#[test]
fn privacy_level_serializes_lowercase() {
    let value = serde_json::to_value(PrivacyLevel::Strict).unwrap();
    assert_eq!(value, "strict");
}
