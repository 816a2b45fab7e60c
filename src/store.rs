//! Record store: loads the flat monitoring table and exposes it as ordered
//! per-patient groups. The store is read-only after load; every later layer
//! (ledger, session, export) treats it as the immutable source of truth.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;
use crate::models::{CycleRecord, PatientGroup};

/// One row as it appears in the source table. Header names are matched after
/// whitespace trimming. `Cycle Day` stays text at this stage so a coercion
/// failure can be reported together with the offending value.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Patient")]
    patient: String,
    #[serde(rename = "Cycle Day")]
    cycle_day: String,
    #[serde(rename = "Protocol")]
    protocol: String,
    #[serde(rename = "Cycle Notes")]
    cycle_notes: String,
    #[serde(rename = "AMH")]
    amh: String,
    #[serde(rename = "E2")]
    e2: String,
    #[serde(rename = "P4")]
    p4: String,
    #[serde(rename = "Left Ovary Follicles")]
    left_follicles: String,
    #[serde(rename = "Right Ovary Follicles")]
    right_follicles: String,
    #[serde(rename = "Medication Instructions")]
    medication: String,
    #[serde(rename = "Clinician Instruction")]
    clinician_instruction: String,
}

impl RawRecord {
    /// Coerce the cycle day and produce the immutable domain record.
    fn into_record(self) -> Result<CycleRecord, LoadError> {
        let day_text = self.cycle_day.trim();
        let cycle_day = day_text
            .parse::<i64>()
            .map_err(|_| LoadError::InvalidCycleDay {
                patient: self.patient.clone(),
                value: day_text.to_string(),
            })?;
        Ok(CycleRecord {
            patient: self.patient,
            cycle_day,
            protocol: self.protocol,
            cycle_notes: self.cycle_notes,
            amh: self.amh,
            e2: self.e2,
            p4: self.p4,
            left_follicles: self.left_follicles,
            right_follicles: self.right_follicles,
            medication: self.medication,
            clinician_instruction: self.clinician_instruction,
        })
    }
}

/// All patient groups from one loaded table, in first-seen patient order.
#[derive(Debug)]
pub struct RecordStore {
    groups: Vec<PatientGroup>,
}

impl RecordStore {
    /// Open and parse a record table from disk.
    pub fn load_path(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Parse a record table from any reader. Headers are whitespace-trimmed
    /// before column matching; rows are grouped by patient preserving the
    /// order in which each distinct patient first appears, and each group is
    /// sorted ascending by cycle day.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut order: Vec<String> = Vec::new();
        let mut by_patient: HashMap<String, Vec<CycleRecord>> = HashMap::new();

        for row in csv_reader.deserialize::<RawRecord>() {
            let record = row?.into_record()?;
            if !by_patient.contains_key(&record.patient) {
                order.push(record.patient.clone());
            }
            by_patient
                .entry(record.patient.clone())
                .or_default()
                .push(record);
        }

        let mut groups = Vec::with_capacity(order.len());
        for patient in order {
            let mut records = by_patient
                .remove(&patient)
                .unwrap_or_default();
            records.sort_by_key(|record| record.cycle_day);
            for pair in records.windows(2) {
                if pair[0].cycle_day == pair[1].cycle_day {
                    return Err(LoadError::DuplicateCycleDay {
                        patient,
                        day: pair[0].cycle_day,
                    });
                }
            }
            groups.push(PatientGroup { patient, records });
        }

        Ok(Self { groups })
    }

    pub fn patient_count(&self) -> usize {
        self.groups.len()
    }

    pub fn patient_at(&self, index: usize) -> Option<&PatientGroup> {
        self.groups.get(index)
    }

    pub fn groups(&self) -> &[PatientGroup] {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Patient,Cycle Day,Protocol,Cycle Notes,AMH,E2,P4,\
Left Ovary Follicles,Right Ovary Follicles,Medication Instructions,\
Clinician Instruction";

    fn row(patient: &str, day: &str) -> String {
        format!(
            "{patient},{day},Antagonist,Baseline normal,2.1,150,0.4,\
3 follicles,4 follicles,Gonal-F 225 IU,Continue current dose"
        )
    }

    fn load(body: &str) -> Result<RecordStore, LoadError> {
        RecordStore::from_reader(body.as_bytes())
    }

    #[test]
    fn groups_preserve_first_seen_patient_order() {
        let table = format!(
            "{HEADER}\n{}\n{}\n{}\n{}",
            row("Beta", "1"),
            row("Alpha", "1"),
            row("Beta", "2"),
            row("Alpha", "2"),
        );
        let store = load(&table).unwrap();
        assert_eq!(store.patient_count(), 2);
        assert_eq!(store.patient_at(0).unwrap().patient, "Beta");
        assert_eq!(store.patient_at(1).unwrap().patient, "Alpha");
    }

    #[test]
    fn days_sort_ascending_regardless_of_row_order() {
        let table = format!(
            "{HEADER}\n{}\n{}\n{}",
            row("P1", "10"),
            row("P1", "2"),
            row("P1", "5"),
        );
        let store = load(&table).unwrap();
        let days = store.patient_at(0).unwrap().days();
        assert_eq!(days, vec![2, 5, 10]);
        assert!(days.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn headers_are_trimmed_before_matching() {
        let padded_header = HEADER
            .split(',')
            .map(|name| format!("  {name} "))
            .collect::<Vec<_>>()
            .join(",");
        let table = format!("{padded_header}\n{}", row("P1", "3"));
        let store = load(&table).unwrap();
        assert_eq!(store.patient_at(0).unwrap().first().cycle_day, 3);
    }

    #[test]
    fn non_integer_cycle_day_is_fatal() {
        let table = format!("{HEADER}\n{}", row("P1", "day one"));
        match load(&table) {
            Err(LoadError::InvalidCycleDay { patient, value }) => {
                assert_eq!(patient, "P1");
                assert_eq!(value, "day one");
            }
            other => panic!("expected InvalidCycleDay, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_cycle_day_is_fatal() {
        let table = format!("{HEADER}\n{}\n{}", row("P1", "4"), row("P1", "4"));
        match load(&table) {
            Err(LoadError::DuplicateCycleDay { patient, day }) => {
                assert_eq!(patient, "P1");
                assert_eq!(day, 4);
            }
            other => panic!("expected DuplicateCycleDay, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_column_is_malformed() {
        let table = "Patient,Cycle Day\nP1,1";
        assert!(matches!(load(table), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn empty_table_loads_with_zero_patients() {
        let store = load(HEADER).unwrap();
        assert_eq!(store.patient_count(), 0);
    }
}
