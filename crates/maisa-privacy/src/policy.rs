//! Redaction policy table.
//!
//! Each row maps one class of fields to the transform applied at each
//! privacy level. The redaction code looks transforms up here and never
//! branches on the level itself.

use maisa_model::{PrivacyLevel, TimePrecision};

/// A group of record fields that share a disclosure rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldClass {
    /// Name, national id, address, phone, email.
    DirectIdentifier,
    /// Date of birth, together with the age derived from it.
    DateOfBirth,
    Gender,
    /// Provider or author name of an encounter.
    Provider,
    EncounterNotes,
    EncounterDates,
    /// Medications, labs, diagnoses, procedures, immunizations, allergies,
    /// social history.
    Clinical,
}

impl FieldClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::DirectIdentifier => "direct identifiers",
            Self::DateOfBirth => "date of birth",
            Self::Gender => "gender",
            Self::Provider => "provider names",
            Self::EncounterNotes => "encounter notes",
            Self::EncounterDates => "encounter dates",
            Self::Clinical => "clinical entries",
        }
    }
}

/// What happens to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Keep,
    /// Present values become [`crate::REDACTED`].
    Suppress,
    /// Suppressed, with the age computed from the original value attached.
    SuppressWithAge,
    /// Emptied.
    Clear,
    /// Dates truncated to the given precision.
    Generalize(TimePrecision),
}

impl Transform {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Keep => "kept",
            Self::Suppress => "suppressed",
            Self::SuppressWithAge => "suppressed, replaced by age",
            Self::Clear => "emptied",
            Self::Generalize(TimePrecision::Year) => "generalized to year",
            Self::Generalize(_) => "generalized to year-month",
        }
    }
}

/// One row of the policy table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub class: FieldClass,
    pub full: Transform,
    pub redacted: Transform,
    pub strict: Transform,
}

impl Rule {
    pub fn at(&self, level: PrivacyLevel) -> Transform {
        match level {
            PrivacyLevel::Full => self.full,
            PrivacyLevel::Redacted => self.redacted,
            PrivacyLevel::Strict => self.strict,
        }
    }
}

const fn rule(class: FieldClass, full: Transform, redacted: Transform, strict: Transform) -> Rule {
    Rule {
        class,
        full,
        redacted,
        strict,
    }
}

use Transform::{Clear, Generalize, Keep, Suppress, SuppressWithAge};

pub const POLICY: [Rule; 7] = [
    rule(FieldClass::DirectIdentifier, Keep, Suppress, Suppress),
    rule(FieldClass::DateOfBirth, Keep, SuppressWithAge, Suppress),
    rule(FieldClass::Gender, Keep, Keep, Keep),
    rule(FieldClass::Provider, Keep, Suppress, Suppress),
    rule(FieldClass::EncounterNotes, Keep, Keep, Clear),
    rule(FieldClass::EncounterDates, Keep, Keep, Generalize(TimePrecision::Month)),
    rule(FieldClass::Clinical, Keep, Keep, Keep),
];

/// The transform for `class` at `level`.
pub fn transform(class: FieldClass, level: PrivacyLevel) -> Transform {
    POLICY
        .iter()
        .find(|rule| rule.class == class)
        .map_or(Transform::Keep, |rule| rule.at(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_class_has_exactly_one_rule() {
        let classes = [
            FieldClass::DirectIdentifier,
            FieldClass::DateOfBirth,
            FieldClass::Gender,
            FieldClass::Provider,
            FieldClass::EncounterNotes,
            FieldClass::EncounterDates,
            FieldClass::Clinical,
        ];
        for class in classes {
            assert_eq!(POLICY.iter().filter(|rule| rule.class == class).count(), 1, "{class:?}");
        }
    }

    #[test]
    fn full_keeps_everything() {
        assert!(POLICY.iter().all(|rule| rule.full == Transform::Keep));
    }

    #[test]
    fn lookups_follow_the_table() {
        assert_eq!(
            transform(FieldClass::DateOfBirth, PrivacyLevel::Redacted),
            Transform::SuppressWithAge
        );
        assert_eq!(
            transform(FieldClass::EncounterDates, PrivacyLevel::Strict),
            Transform::Generalize(TimePrecision::Month)
        );
        assert_eq!(transform(FieldClass::Gender, PrivacyLevel::Strict), Transform::Keep);
    }
}
