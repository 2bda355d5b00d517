use chrono::{TimeZone, Utc};
use maisa_model::{
    AllergyEntry, CodeSystem, Diagnosis, DiagnosisStatus, DocumentSummary, HealthRecord,
    PrivacyLevel,
};
use maisa_report::{Envelope, ReportError, write_json};

fn record() -> HealthRecord {
    HealthRecord {
        allergies: vec![AllergyEntry::NoKnownAllergy],
        diagnoses: vec![Diagnosis {
            code: "J45.9".to_string(),
            code_system: CodeSystem::Icd10,
            display_name: "Astma".to_string(),
            status: DiagnosisStatus::Active,
            onset: Some("2020-01-05".to_string()),
        }],
        encounters: vec![DocumentSummary {
            document_id: None,
            date: Some("2024-03".to_string()),
            doc_type: "Hoitokertomus".to_string(),
            provider: None,
            notes: String::new(),
            source_file: "DOC0002.XML".to_string(),
        }],
        ..HealthRecord::default()
    }
}

#[test]
fn writes_into_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/nested/patient_history.json");
    let record = record();
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();

    write_json(&path, &Envelope::new(&record, PrivacyLevel::Redacted, at)).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.ends_with("}\n"));
    assert!(text.contains("Hoitokertomus"));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["_privacy_level"], "redacted");
    assert_eq!(value["_generated_at"], "2024-06-01T08:30:00Z");

    let health = &value["health_record"];
    assert_eq!(health["allergies"][0]["status"], "no-known-allergy");
    assert_eq!(health["diagnoses"][0]["code_system"], "ICD-10");
    assert_eq!(health["diagnoses"][0]["status"], "active");
    assert_eq!(health["encounters"][0]["type"], "Hoitokertomus");
    assert_eq!(health["encounters"][0]["date"], "2024-03");
    assert!(health["patient_profile"]["dob"].is_null());
}

#[test]
fn unwritable_target_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "x").unwrap();
    let record = record();
    let envelope = Envelope::new(&record, PrivacyLevel::Full, Utc::now());

    let err = write_json(&blocker.join("patient_history.json"), &envelope).unwrap_err();
    assert!(matches!(err, ReportError::Write { .. }));
}
