//! Cross-document merge and dedup.
//!
//! Per-document extractions are folded, in file order, into one
//! [`HealthRecord`]. Entities sharing an identity key collapse to one:
//! the entry whose [`Provenance`] ranks higher replaces the other in place,
//! so sequences keep first-seen order. Provenances rank by clinical time,
//! then by file order; an undated document ranks below every dated one.
//! Duplicates inside one document keep the first occurrence.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use maisa_model::{
    AllergyEntry, ClinicalTime, HealthRecord, Identity, PatientProfile, ValidationError,
    order_encounters,
};
use tracing::{debug, info_span, warn};

use crate::error::PipelineError;
use crate::extract::DocumentExtraction;

/// Where an entity came from, for last-write-wins.
///
/// Ordered by `(time, order)` with `None` below every time, so the winner
/// among several documents does not depend on the order they are folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Provenance {
    pub time: Option<ClinicalTime>,
    pub order: usize,
}

impl Provenance {
    /// Whether an entity from `self` replaces one from `existing`.
    pub fn supersedes(&self, existing: &Provenance) -> bool {
        self > existing
    }
}

/// Keyed, order-preserving collection with last-write-wins replacement.
#[derive(Debug)]
pub struct Accumulator<T: Identity> {
    entries: Vec<(T, Provenance)>,
    index: HashMap<T::Key, usize>,
}

impl<T: Identity> Default for Accumulator<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Identity> Accumulator<T> {
    /// Adds `item`; returns `true` when it collided with an existing key.
    pub fn insert(&mut self, item: T, provenance: Provenance) -> bool {
        match self.index.entry(item.identity()) {
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push((item, provenance));
                false
            }
            Entry::Occupied(slot) => {
                let existing = &mut self.entries[*slot.get()];
                if provenance.supersedes(&existing.1) {
                    *existing = (item, provenance);
                }
                true
            }
        }
    }

    pub fn extend(&mut self, items: Vec<T>, provenance: Provenance) -> usize {
        items
            .into_iter()
            .map(|item| self.insert(item, provenance))
            .filter(|collided| *collided)
            .count()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.entries.into_iter().map(|(item, _)| item).collect()
    }
}

/// Merged record plus the warnings raised while merging.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutput {
    pub record: HealthRecord,
    pub warnings: Vec<String>,
}

/// Folds per-document extractions into one record.
///
/// The patient profile comes from the summary document (`summary_file`).
/// When the summary is missing or has no profile, the first document with
/// one is used and a warning is raised.
///
/// # Errors
///
/// [`PipelineError::MissingPatientProfile`] when no document carries a
/// profile, [`PipelineError::InvalidPatientProfile`] when the chosen one
/// fails validation.
pub fn merge_extractions(
    extractions: Vec<DocumentExtraction>,
    summary_file: Option<&str>,
) -> Result<MergeOutput, PipelineError> {
    let span = info_span!("merge", documents = extractions.len());
    let _guard = span.enter();

    let mut warnings = Vec::new();
    let profile = select_profile(&extractions, summary_file, &mut warnings)?;
    profile
        .validate()
        .map_err(PipelineError::InvalidPatientProfile)?;

    let mut allergies = Accumulator::default();
    let mut medications = Accumulator::default();
    let mut lab_results = Accumulator::default();
    let mut diagnoses = Accumulator::default();
    let mut procedures = Accumulator::default();
    let mut immunizations = Accumulator::default();
    let mut social_history = Accumulator::default();
    let mut encounters = Vec::new();
    let mut seen_documents = HashMap::new();
    let mut duplicates = 0;

    for extraction in extractions {
        let provenance = Provenance {
            time: extraction.document_time,
            order: extraction.order,
        };
        let sections = extraction.sections;
        duplicates += allergies.extend(sections.allergies, provenance);
        duplicates += medications.extend(sections.medications, provenance);
        duplicates += lab_results.extend(sections.lab_results, provenance);
        duplicates += diagnoses.extend(sections.diagnoses, provenance);
        duplicates += procedures.extend(sections.procedures, provenance);
        duplicates += immunizations.extend(sections.immunizations, provenance);
        duplicates += social_history.extend(sections.social_history, provenance);

        if let Some(summary) = extraction.summary {
            let key = summary
                .document_id
                .clone()
                .unwrap_or_else(|| extraction.fingerprint.clone());
            match seen_documents.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(extraction.source_file.clone());
                    encounters.push(summary);
                }
                Entry::Occupied(slot) => {
                    debug!(
                        source_file = %extraction.source_file,
                        first_seen = %slot.get(),
                        "duplicate document skipped"
                    );
                }
            }
        }
        warnings.extend(extraction.warnings);
    }

    let allergies = reconcile_allergies(allergies.into_vec(), &mut warnings);
    let record = HealthRecord {
        patient_profile: profile,
        allergies,
        medications: medications.into_vec(),
        lab_results: lab_results.into_vec(),
        diagnoses: diagnoses.into_vec(),
        procedures: procedures.into_vec(),
        immunizations: immunizations.into_vec(),
        social_history: social_history.into_vec(),
        encounters: order_encounters(encounters),
    };
    debug!(
        duplicates,
        medications = record.medications.len(),
        encounters = record.encounters.len(),
        "merge complete"
    );

    Ok(MergeOutput { record, warnings })
}

fn select_profile(
    extractions: &[DocumentExtraction],
    summary_file: Option<&str>,
    warnings: &mut Vec<String>,
) -> Result<PatientProfile, PipelineError> {
    if let Some(summary_file) = summary_file
        && let Some(profile) = extractions
            .iter()
            .find(|extraction| extraction.source_file == summary_file)
            .and_then(|extraction| extraction.profile.clone())
    {
        return Ok(profile);
    }

    let Some(fallback) = extractions
        .iter()
        .find(|extraction| extraction.profile.is_some())
    else {
        return Err(PipelineError::MissingPatientProfile);
    };
    let message = format!(
        "{}: patient profile taken from this document; the summary document has none",
        fallback.source_file
    );
    warn!(source_file = %fallback.source_file, "patient profile taken from a narrative document");
    warnings.push(message);
    Ok(fallback.profile.clone().unwrap_or_default())
}

/// Drops a "no known allergies" statement that another document
/// contradicts with a concrete substance.
fn reconcile_allergies(allergies: Vec<AllergyEntry>, warnings: &mut Vec<String>) -> Vec<AllergyEntry> {
    let has_substance = allergies
        .iter()
        .any(|allergy| matches!(allergy, AllergyEntry::HasAllergy { .. }));
    let has_negation = allergies.contains(&AllergyEntry::NoKnownAllergy);
    if !(has_substance && has_negation) {
        return allergies;
    }

    let conflict = ValidationError::Conflict {
        entity: "allergy",
        message: "\"no known allergies\" contradicted by a recorded substance; keeping the substances",
    };
    warn!(%conflict, "allergy statements disagree");
    warnings.push(conflict.to_string());
    allergies
        .into_iter()
        .filter(|allergy| *allergy != AllergyEntry::NoKnownAllergy)
        .collect()
}
