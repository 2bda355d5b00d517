use std::fmt;

use chrono::NaiveDate;
use maisa_model::{DocumentSummary, HealthRecord, PatientProfile, PrivacyLevel};
use tracing::{info, info_span, warn};

use crate::REDACTED;
use crate::dates::{calculate_age, generalize_date};
use crate::policy::{FieldClass, POLICY, Transform, transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// Operator-facing note on what a privacy level removed or kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A redacted copy of a record and the advisories for its level.
#[derive(Debug, Clone, PartialEq)]
pub struct Redaction {
    pub record: HealthRecord,
    pub advisories: Vec<Advisory>,
}

/// Builds a redacted copy of `record`. The input is left untouched.
///
/// `today` anchors the age derived from a suppressed date of birth.
/// Redacting an already redacted record at the same level yields the same
/// record.
pub fn redact(record: &HealthRecord, level: PrivacyLevel, today: NaiveDate) -> Redaction {
    let rule = |class| transform(class, level);
    let encounter_rules = EncounterRules {
        provider: rule(FieldClass::Provider),
        notes: rule(FieldClass::EncounterNotes),
        dates: rule(FieldClass::EncounterDates),
    };

    // Structured entries carry no direct identifiers; the table keeps them
    // at every level.
    let redacted = HealthRecord {
        patient_profile: redact_profile(&record.patient_profile, level, today),
        allergies: record.allergies.clone(),
        medications: record.medications.clone(),
        lab_results: record.lab_results.clone(),
        diagnoses: record.diagnoses.clone(),
        procedures: record.procedures.clone(),
        immunizations: record.immunizations.clone(),
        social_history: record.social_history.clone(),
        encounters: record
            .encounters
            .iter()
            .map(|encounter| encounter_rules.apply(encounter))
            .collect(),
    };

    Redaction {
        record: redacted,
        advisories: advisories(level),
    }
}

/// [`redact`], with the advisories logged.
pub fn apply_privacy(record: &HealthRecord, level: PrivacyLevel, today: NaiveDate) -> HealthRecord {
    let span = info_span!("redact", %level);
    let _guard = span.enter();

    let redaction = redact(record, level, today);
    for advisory in &redaction.advisories {
        match advisory.severity {
            Severity::Info => info!("{advisory}"),
            Severity::Warning => warn!("{advisory}"),
        }
    }
    redaction.record
}

/// What `level` removes and keeps, derived from the policy table.
pub fn advisories(level: PrivacyLevel) -> Vec<Advisory> {
    let changed: Vec<String> = POLICY
        .iter()
        .filter(|rule| rule.at(level) != Transform::Keep)
        .map(|rule| format!("{} {}", rule.class.label(), rule.at(level).describe()))
        .collect();

    if changed.is_empty() {
        return vec![Advisory {
            severity: Severity::Warning,
            message: format!(
                "privacy level {level}: no redaction applied; the output contains every personal \
                 identifier and unredacted notes. Do not upload it to cloud services."
            ),
        }];
    }

    let mut advisories = vec![Advisory {
        severity: Severity::Info,
        message: format!("privacy level {level}: {}", changed.join("; ")),
    }];
    if transform(FieldClass::EncounterNotes, level) == Transform::Keep {
        advisories.push(Advisory {
            severity: Severity::Warning,
            message: "free-text notes are kept and may still contain identifying information; \
                      use --privacy strict before sharing the output"
                .to_string(),
        });
    }
    advisories
}

fn redact_profile(profile: &PatientProfile, level: PrivacyLevel, today: NaiveDate) -> PatientProfile {
    let identifiers = transform(FieldClass::DirectIdentifier, level);
    let dob = transform(FieldClass::DateOfBirth, level);

    let age = match dob {
        Transform::Keep => profile.age,
        // A dob suppressed by an earlier pass no longer parses; keep its age.
        Transform::SuppressWithAge => profile
            .dob
            .as_deref()
            .and_then(|dob| calculate_age(dob, today))
            .or(profile.age),
        _ => None,
    };

    PatientProfile {
        full_name: optional(identifiers, profile.full_name.as_deref()),
        national_id: optional(identifiers, profile.national_id.as_deref()),
        dob: optional(dob, profile.dob.as_deref()),
        age,
        gender: optional(transform(FieldClass::Gender, level), profile.gender.as_deref()),
        address: optional(identifiers, profile.address.as_deref()),
        phone: optional(identifiers, profile.phone.as_deref()),
        email: optional(identifiers, profile.email.as_deref()),
    }
}

struct EncounterRules {
    provider: Transform,
    notes: Transform,
    dates: Transform,
}

impl EncounterRules {
    fn apply(&self, encounter: &DocumentSummary) -> DocumentSummary {
        DocumentSummary {
            document_id: encounter.document_id.clone(),
            date: optional(self.dates, encounter.date.as_deref()),
            doc_type: encounter.doc_type.clone(),
            provider: optional(self.provider, encounter.provider.as_deref()),
            notes: text(self.notes, &encounter.notes),
            source_file: encounter.source_file.clone(),
        }
    }
}

fn optional(transform: Transform, value: Option<&str>) -> Option<String> {
    match transform {
        Transform::Keep => value.map(str::to_string),
        Transform::Suppress | Transform::SuppressWithAge => value.map(|_| REDACTED.to_string()),
        Transform::Clear => None,
        Transform::Generalize(precision) => generalize_date(value, precision),
    }
}

fn text(transform: Transform, value: &str) -> String {
    match transform {
        Transform::Clear => String::new(),
        Transform::Suppress | Transform::SuppressWithAge if !value.is_empty() => {
            REDACTED.to_string()
        }
        _ => value.to_string(),
    }
}
