use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use maisa_model::{HealthRecord, PrivacyLevel};

use crate::types::RunResult;

pub fn print_summary(result: &RunResult) {
    println!("Output: {}", result.output.display());
    println!("Privacy level: {}", result.privacy);
    if result.skipped > 0 {
        println!(
            "Documents: {} processed, {} skipped",
            result.documents, result.skipped
        );
    } else {
        println!("Documents: {} processed", result.documents);
    }

    let mut table = Table::new();
    table.set_header(vec![header_cell("Section"), header_cell("Entries")]);
    apply_summary_table_style(&mut table);
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    let rows = section_counts(&result.record);
    let total: usize = rows.iter().map(|(_, count)| count).sum();
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), count_cell(count)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if result.privacy == PrivacyLevel::Full {
        eprintln!("WARNING: output is unredacted; keep it on this machine.");
    }
    if !result.warnings.is_empty() {
        eprintln!("Warnings:");
        for warning in &result.warnings {
            eprintln!("- {warning}");
        }
    }
}

/// Entry counts per output section, in output order.
pub fn section_counts(record: &HealthRecord) -> Vec<(&'static str, usize)> {
    vec![
        ("Allergies", record.allergies.len()),
        ("Active medications", record.active_medications().count()),
        ("Medication history", record.medication_history().count()),
        ("Lab results", record.lab_results.len()),
        ("Diagnoses", record.diagnoses.len()),
        ("Procedures", record.procedures.len()),
        ("Immunizations", record.immunizations.len()),
        ("Social history", record.social_history.len()),
        ("Encounters", record.encounters.len()),
    ]
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(60);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maisa_model::{AllergyEntry, MedicationEntry, MedicationStatus};

    fn medication(status: MedicationStatus) -> MedicationEntry {
        MedicationEntry {
            name: "Burana 400 mg".to_string(),
            code: None,
            dose: None,
            route: None,
            start: None,
            stop: None,
            status,
        }
    }

    #[test]
    fn counts_split_medications_by_status() {
        let record = HealthRecord {
            allergies: vec![AllergyEntry::NoKnownAllergy],
            medications: vec![
                medication(MedicationStatus::Active),
                medication(MedicationStatus::Historical),
                medication(MedicationStatus::Historical),
            ],
            ..HealthRecord::default()
        };
        let counts = section_counts(&record);
        assert_eq!(counts[0], ("Allergies", 1));
        assert_eq!(counts[1], ("Active medications", 1));
        assert_eq!(counts[2], ("Medication history", 2));
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<usize>(), 4);
    }
}
