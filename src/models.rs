//! Domain models for the monitoring records being annotated. These stay
//! light-weight data holders so the store, session, and UI layers can focus on
//! ordering, navigation, and presentation logic. Field values other than the
//! cycle day are kept as the source text verbatim; the tool displays clinical
//! measurements, it never interprets them.

/// One monitoring row for a single patient on a single cycle day. Immutable
/// once loaded.
#[derive(Debug, Clone)]
pub struct CycleRecord {
    /// Patient identifier exactly as it appears in the source table.
    pub patient: String,
    /// Day-of-cycle, coerced to an integer at load so groups sort numerically
    /// (day 2 before day 10) and annotations can key on it.
    pub cycle_day: i64,
    /// Stimulation protocol name. Patient-level: repeated on every row.
    pub protocol: String,
    /// Free-text notes about the cycle. Patient-level: repeated on every row.
    pub cycle_notes: String,
    /// Anti-Müllerian hormone value. Patient-level context for the reviewer.
    pub amh: String,
    /// Estradiol measurement for this day.
    pub e2: String,
    /// Progesterone measurement for this day.
    pub p4: String,
    /// Follicle counts per ovary, kept as text (sources mix plain counts and
    /// size-bucketed breakdowns).
    pub left_follicles: String,
    pub right_follicles: String,
    /// Medication instructions issued on this day.
    pub medication: String,
    /// The clinician's instruction the nurse is summarizing for the patient.
    pub clinician_instruction: String,
}

/// Every record for one patient, sorted ascending by cycle day. Groups are
/// built by the store and are never empty.
#[derive(Debug, Clone)]
pub struct PatientGroup {
    pub patient: String,
    pub records: Vec<CycleRecord>,
}

impl PatientGroup {
    /// The ordered cycle days for this patient. Strictly ascending with no
    /// duplicates; the store rejects tables that would violate this.
    pub fn days(&self) -> Vec<i64> {
        self.records.iter().map(|record| record.cycle_day).collect()
    }

    pub fn day_count(&self) -> usize {
        self.records.len()
    }

    /// The first row, used for patient-level display fields (protocol, cycle
    /// notes, AMH) which repeat on every row of the source table.
    pub fn first(&self) -> &CycleRecord {
        &self.records[0]
    }

    /// Look up the record for a specific cycle day.
    pub fn record_for_day(&self, day: i64) -> Option<&CycleRecord> {
        self.records.iter().find(|record| record.cycle_day == day)
    }
}
