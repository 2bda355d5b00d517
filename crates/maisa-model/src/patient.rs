use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::time::{ClinicalTime, TimePrecision};

/// Patient demographics from the summary document's `recordTarget`.
///
/// `age` is never read from a source document. It is derived during
/// redaction, and only once `dob` has been suppressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    /// ISO 8601 date of birth: `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    pub dob: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl PatientProfile {
    /// Checks the constraints an extracted profile must satisfy.
    pub fn validate(&self) -> Result<()> {
        if let Some(dob) = &self.dob {
            let valid = ClinicalTime::parse_iso(dob)
                .is_some_and(|parsed| parsed.precision() <= TimePrecision::Day);
            if !valid {
                return Err(ValidationError::InvalidDate {
                    entity: "patient_profile",
                    field: "dob",
                    value: dob.clone(),
                });
            }
        }
        if self.age.is_some() && self.dob_is_disclosed() {
            return Err(ValidationError::Conflict {
                entity: "patient_profile",
                message: "age is only disclosed in place of a suppressed dob",
            });
        }
        Ok(())
    }

    fn dob_is_disclosed(&self) -> bool {
        self.dob
            .as_deref()
            .is_some_and(|dob| ClinicalTime::parse_iso(dob).is_some())
    }
}
