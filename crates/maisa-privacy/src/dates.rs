//! Age computation and date generalization.

use chrono::{Datelike, NaiveDate};
use maisa_model::{ClinicalTime, TimePrecision};

/// Whole years from `dob` to `today`.
///
/// `dob` may be `YYYY`, `YYYY-MM` or `YYYY-MM-DD`. A year-only value ignores
/// the birthday; a year-month value assumes the first of the month. `None`
/// for unparsable values and birth dates after `today`.
pub fn calculate_age(dob: &str, today: NaiveDate) -> Option<u32> {
    let birth = ClinicalTime::parse_iso(dob)?;
    let mut years = today.year() - birth.year();
    if let Some(month) = birth.month() {
        let day = birth.day().unwrap_or(1);
        if (today.month(), today.day()) < (month, day) {
            years -= 1;
        }
    }
    u32::try_from(years).ok()
}

/// Truncates an ISO date to `precision`.
///
/// Values already at or below the precision come back unchanged, never
/// padded. Unparsable values are returned as-is.
pub fn generalize_date(value: Option<&str>, precision: TimePrecision) -> Option<String> {
    let value = value?;
    match ClinicalTime::parse_iso(value) {
        Some(time) if time.precision() > precision => Some(time.truncate(precision).to_iso()),
        _ => Some(value.to_string()),
    }
}
