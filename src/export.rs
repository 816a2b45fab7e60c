//! Export formatter: merges a patient's committed summaries back into their
//! monitoring rows and serializes the result as a downloadable CSV artifact.

use csv::Writer;

use crate::error::ExportError;
use crate::ledger::Ledger;
use crate::models::PatientGroup;

/// Column order of the annotated output: the source schema plus a trailing
/// summary column.
const EXPORT_HEADER: [&str; 12] = [
    "Patient",
    "Cycle Day",
    "Protocol",
    "Cycle Notes",
    "AMH",
    "E2",
    "P4",
    "Left Ovary Follicles",
    "Right Ovary Follicles",
    "Medication Instructions",
    "Clinician Instruction",
    "Summary",
];

/// A finished annotated table waiting for the operator to download it. Held
/// in session state until the patient changes; never persisted by the core.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub csv: String,
}

/// Serialize one patient group with its ledger merged in. Rows keep the
/// group's day order; a day without a ledger entry gets an empty summary
/// rather than an error, so a partially annotated group still exports
/// cleanly.
pub fn build(
    group: &PatientGroup,
    ledger: &Ledger,
    operator: &str,
) -> Result<ExportArtifact, ExportError> {
    let mut buffer = Vec::new();
    {
        let mut writer = Writer::from_writer(&mut buffer);
        writer.write_record(EXPORT_HEADER)?;
        for record in &group.records {
            let summary = ledger.get(record.cycle_day).unwrap_or("");
            let day = record.cycle_day.to_string();
            writer.write_record([
                record.patient.as_str(),
                day.as_str(),
                record.protocol.as_str(),
                record.cycle_notes.as_str(),
                record.amh.as_str(),
                record.e2.as_str(),
                record.p4.as_str(),
                record.left_follicles.as_str(),
                record.right_follicles.as_str(),
                record.medication.as_str(),
                record.clinician_instruction.as_str(),
                summary,
            ])?;
        }
        writer.flush().map_err(csv::Error::from)?;
    }

    Ok(ExportArtifact {
        filename: filename_for(&group.patient, operator),
        csv: String::from_utf8_lossy(&buffer).into_owned(),
    })
}

/// Derive the download filename from the patient and operator, replacing
/// spaces with underscores in both substitutions.
fn filename_for(patient: &str, operator: &str) -> String {
    format!(
        "annotated_{}_nurse_{}.csv",
        patient.replace(' ', "_"),
        operator.replace(' ', "_"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CycleRecord;

    fn record(patient: &str, day: i64) -> CycleRecord {
        CycleRecord {
            patient: patient.to_string(),
            cycle_day: day,
            protocol: "Antagonist".to_string(),
            cycle_notes: "Baseline normal".to_string(),
            amh: "2.1".to_string(),
            e2: format!("{}", 100 + day * 50),
            p4: "0.4".to_string(),
            left_follicles: "3 follicles".to_string(),
            right_follicles: "4 follicles".to_string(),
            medication: "Gonal-F 225 IU".to_string(),
            clinician_instruction: "Continue current dose".to_string(),
        }
    }

    fn group(patient: &str, days: &[i64]) -> PatientGroup {
        PatientGroup {
            patient: patient.to_string(),
            records: days.iter().map(|&day| record(patient, day)).collect(),
        }
    }

    #[test]
    fn one_row_per_record_with_matching_summaries() {
        let group = group("P1", &[1, 2, 3]);
        let mut ledger = Ledger::new();
        ledger.set(1, "day one summary").unwrap();
        ledger.set(2, "day two summary").unwrap();
        ledger.set(3, "day three summary").unwrap();

        let artifact = build(&group, &ledger, "Jane Doe").unwrap();
        let lines: Vec<&str> = artifact.csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with(",Summary"));
        assert!(lines[1].ends_with(",day one summary"));
        assert!(lines[2].ends_with(",day two summary"));
        assert!(lines[3].ends_with(",day three summary"));
    }

    #[test]
    fn missing_ledger_entries_become_empty_summaries() {
        let group = group("P1", &[1, 2]);
        let mut ledger = Ledger::new();
        ledger.set(1, "only the first day").unwrap();

        let artifact = build(&group, &ledger, "Jane").unwrap();
        let lines: Vec<&str> = artifact.csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].ends_with(","));
    }

    #[test]
    fn filename_replaces_spaces_in_patient_and_operator() {
        let group = group("Mary Ann Smith", &[1]);
        let ledger = Ledger::new();
        let artifact = build(&group, &ledger, "Jane Doe").unwrap();
        assert_eq!(
            artifact.filename,
            "annotated_Mary_Ann_Smith_nurse_Jane_Doe.csv"
        );
    }

    #[test]
    fn summaries_containing_commas_are_quoted() {
        let group = group("P1", &[1]);
        let mut ledger = Ledger::new();
        ledger
            .set(1, "E2 is rising, follicles are on track.")
            .unwrap();
        let artifact = build(&group, &ledger, "Jane").unwrap();
        assert!(artifact
            .csv
            .contains("\"E2 is rising, follicles are on track.\""));
    }
}
