//! Output for consolidated health records.
//!
//! Records are written as pretty-printed UTF-8 JSON inside an [`Envelope`]
//! that states the schema version, the privacy level applied and when and
//! by what the file was generated.

pub mod envelope;
pub mod error;

pub use envelope::{Envelope, GENERATOR_NAME, SCHEMA_VERSION, render_json, write_json};
pub use error::{ReportError, Result};
