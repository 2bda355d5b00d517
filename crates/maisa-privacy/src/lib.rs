//! Privacy redaction for health records.
//!
//! Three levels, each a one-shot transform from a record to a new record:
//!
//! | Field class | full | redacted | strict |
//! |---|---|---|---|
//! | Direct identifiers | kept | suppressed | suppressed |
//! | Date of birth | kept | suppressed, age attached | suppressed, no age |
//! | Gender | kept | kept | kept |
//! | Provider names | kept | suppressed | suppressed |
//! | Encounter notes | kept | kept | emptied |
//! | Encounter dates | kept | kept | year-month |
//! | Clinical entries | kept | kept | kept |
//!
//! The table lives in [`policy::POLICY`]. Redaction is best-effort field
//! suppression, not anonymization.

pub mod dates;
pub mod policy;
pub mod redact;

/// Placeholder for suppressed values.
pub const REDACTED: &str = "[REDACTED]";

pub use dates::{calculate_age, generalize_date};
pub use policy::{FieldClass, POLICY, Rule, Transform, transform};
pub use redact::{Advisory, Redaction, Severity, advisories, apply_privacy, redact};
