//! The navigation state machine for one operator's working session. All
//! mutable state lives in an explicitly constructed `Session`; the UI layer
//! only calls transition methods and re-reads the result. Every transition is
//! atomic: it either completes fully or returns an error with the session
//! exactly as it was.
//!
//! Forward progress within a patient is annotation-gated (a day cannot be
//! skipped without a committed summary), while movement across patients is
//! operator-discretionary: skip and redo are deliberate escape hatches for
//! workflow interruptions and are never gated on export.

use crate::error::TransitionError;
use crate::export::{self, ExportArtifact};
use crate::ledger::Ledger;
use crate::models::PatientGroup;
use crate::store::RecordStore;

/// Top-level phases of a session. `ReadyToExport` is not a phase of its own:
/// it holds within `Reviewing` while a pending artifact exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Operator identity not yet captured.
    Onboarding,
    /// Normal browsing through the current patient's days.
    Reviewing,
    /// The patient index ran past the last patient.
    AllComplete,
}

/// One operator's in-memory working session over a loaded record store.
/// Nothing here persists; closing the session loses unsaved progress.
#[derive(Debug)]
pub struct Session {
    store: RecordStore,
    operator: Option<String>,
    patient_index: usize,
    day_index: usize,
    ledger: Ledger,
    pending_export: Option<ExportArtifact>,
}

impl Session {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            operator: None,
            patient_index: 0,
            day_index: 0,
            ledger: Ledger::new(),
            pending_export: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.operator.is_none() {
            Phase::Onboarding
        } else if self.patient_index >= self.store.patient_count() {
            Phase::AllComplete
        } else {
            Phase::Reviewing
        }
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    pub fn patient_index(&self) -> usize {
        self.patient_index
    }

    pub fn patient_count(&self) -> usize {
        self.store.patient_count()
    }

    pub fn day_index(&self) -> usize {
        self.day_index
    }

    pub fn current_patient(&self) -> Option<&PatientGroup> {
        self.store.patient_at(self.patient_index)
    }

    /// Cycle day currently in view, when a patient is in view at all.
    pub fn current_day(&self) -> Option<i64> {
        self.current_patient()
            .and_then(|group| group.days().get(self.day_index).copied())
    }

    /// Committed summary text for a day of the current patient.
    pub fn annotation(&self, day: i64) -> Option<&str> {
        self.ledger.get(day)
    }

    pub fn is_final_day(&self) -> bool {
        self.current_patient()
            .is_some_and(|group| self.day_index + 1 == group.day_count())
    }

    pub fn can_previous_day(&self) -> bool {
        self.day_index > 0
    }

    pub fn can_previous_patient(&self) -> bool {
        self.patient_index > 0
    }

    pub fn ready_to_export(&self) -> bool {
        self.pending_export.is_some()
    }

    /// The finalized artifact awaiting download, if any.
    pub fn pending_export(&self) -> Option<&ExportArtifact> {
        self.pending_export.as_ref()
    }

    /// Capture the operator's identity and begin reviewing. Only meaningful
    /// before the identity has been set; the identity is immutable for the
    /// rest of the session.
    pub fn set_operator_identity(&mut self, name: &str) -> Result<(), TransitionError> {
        if self.operator.is_some() {
            return Ok(());
        }
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TransitionError::InvalidIdentity);
        }
        self.operator = Some(trimmed.to_string());
        Ok(())
    }

    /// Step back one day. Viewing a prior day never requires a pending
    /// annotation, so there is nothing to validate; a no-op on the first day.
    pub fn previous_day(&mut self) {
        if self.day_index > 0 {
            self.day_index -= 1;
        }
    }

    /// Commit the summary for the current day and advance to the next one.
    /// Refused without state change when the text is blank. A no-op on the
    /// final day, where `save_and_export` takes over.
    pub fn next_day(&mut self, input: &str) -> Result<(), TransitionError> {
        let Some(day) = self.current_day() else {
            return Ok(());
        };
        if self.is_final_day() {
            return Ok(());
        }
        self.ledger.set(day, input)?;
        self.day_index += 1;
        Ok(())
    }

    /// Commit the final day's summary and build the annotated artifact for
    /// download. Enabled only on the final day; blank text is refused with no
    /// state change. Saving again rebuilds and replaces the pending artifact.
    pub fn save_and_export(&mut self, input: &str) -> Result<(), TransitionError> {
        if !self.is_final_day() {
            return Ok(());
        }
        let Some(day) = self.current_day() else {
            return Ok(());
        };
        self.ledger.set(day, input)?;
        let operator = self.operator.clone().unwrap_or_default();
        let artifact = match self.current_patient() {
            Some(group) => export::build(group, &self.ledger, &operator)?,
            None => return Ok(()),
        };
        self.pending_export = Some(artifact);
        Ok(())
    }

    /// Skip to the next patient. Always enabled, saved or not; the operator
    /// decides whether the current patient is done. Running past the last
    /// patient ends the session in `AllComplete`.
    pub fn next_patient(&mut self) {
        self.patient_index += 1;
        self.reset_patient_scope();
    }

    /// Go back and redo the previous patient. A no-op on the first patient.
    pub fn previous_patient(&mut self) {
        if self.patient_index > 0 {
            self.patient_index -= 1;
            self.reset_patient_scope();
        }
    }

    /// Everything scoped to a single patient starts over when the patient
    /// index changes.
    fn reset_patient_scope(&mut self) {
        self.day_index = 0;
        self.ledger.clear();
        self.pending_export = None;
    }

    #[cfg(test)]
    fn ledger_len(&self) -> usize {
        self.ledger.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Patient,Cycle Day,Protocol,Cycle Notes,AMH,E2,P4,\
Left Ovary Follicles,Right Ovary Follicles,Medication Instructions,\
Clinician Instruction";

    /// Build a session over a synthetic table described as
    /// (patient, cycle days) pairs.
    fn session(patients: &[(&str, &[i64])]) -> Session {
        let mut table = String::from(HEADER);
        for (patient, days) in patients {
            for day in *days {
                table.push_str(&format!(
                    "\n{patient},{day},Antagonist,Baseline normal,2.1,150,0.4,\
3,4,Gonal-F 225 IU,Continue current dose"
                ));
            }
        }
        let store = RecordStore::from_reader(table.as_bytes()).unwrap();
        Session::new(store)
    }

    fn reviewing(patients: &[(&str, &[i64])]) -> Session {
        let mut session = session(patients);
        session.set_operator_identity("Jane Doe").unwrap();
        session
    }

    #[test]
    fn blank_operator_name_is_refused() {
        let mut session = session(&[("P1", &[1])]);
        assert!(matches!(
            session.set_operator_identity("   "),
            Err(TransitionError::InvalidIdentity)
        ));
        assert_eq!(session.phase(), Phase::Onboarding);

        session.set_operator_identity("  Jane Doe  ").unwrap();
        assert_eq!(session.operator(), Some("Jane Doe"));
        assert_eq!(session.phase(), Phase::Reviewing);
    }

    #[test]
    fn next_day_commits_trimmed_text_and_advances() {
        let mut session = reviewing(&[("P1", &[1, 2, 3])]);
        session.next_day("  Levels look good.  ").unwrap();
        assert_eq!(session.day_index(), 1);
        assert_eq!(session.current_day(), Some(2));
        assert_eq!(session.annotation(1), Some("Levels look good."));
    }

    #[test]
    fn blank_next_day_is_refused_without_state_change() {
        let mut session = reviewing(&[("P1", &[1, 2, 3])]);
        session.next_day("day one").unwrap();
        assert_eq!(session.day_index(), 1);

        let err = session.next_day("   ").unwrap_err();
        assert!(matches!(err, TransitionError::EmptyAnnotation { day: 2 }));
        assert_eq!(session.day_index(), 1);
        assert_eq!(session.ledger_len(), 1);
    }

    #[test]
    fn next_day_on_final_day_is_a_noop() {
        let mut session = reviewing(&[("P1", &[1])]);
        session.next_day("should not advance").unwrap();
        assert_eq!(session.day_index(), 0);
        assert!(session.annotation(1).is_none());
    }

    #[test]
    fn previous_day_is_a_noop_on_the_first_day() {
        let mut session = reviewing(&[("P1", &[1, 2])]);
        session.previous_day();
        assert_eq!(session.day_index(), 0);

        session.next_day("day one").unwrap();
        session.previous_day();
        assert_eq!(session.day_index(), 0);
        // The earlier commit is still visible when stepping back.
        assert_eq!(session.annotation(1), Some("day one"));
    }

    #[test]
    fn save_and_export_builds_the_artifact_on_the_final_day() {
        let mut session = reviewing(&[("P1", &[1, 2, 3])]);
        session.next_day("day one").unwrap();
        session.next_day("day two").unwrap();
        assert!(session.is_final_day());

        session.save_and_export("day three").unwrap();
        assert!(session.ready_to_export());
        let artifact = session.pending_export().unwrap();
        assert_eq!(artifact.filename, "annotated_P1_nurse_Jane_Doe.csv");
        let lines: Vec<&str> = artifact.csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with(",day one"));
        assert!(lines[2].ends_with(",day two"));
        assert!(lines[3].ends_with(",day three"));
    }

    #[test]
    fn blank_save_is_refused_without_state_change() {
        let mut session = reviewing(&[("P1", &[1])]);
        let err = session.save_and_export(" \t ").unwrap_err();
        assert!(matches!(err, TransitionError::EmptyAnnotation { day: 1 }));
        assert!(!session.ready_to_export());
        assert_eq!(session.ledger_len(), 0);
    }

    #[test]
    fn save_on_a_non_final_day_is_a_noop() {
        let mut session = reviewing(&[("P1", &[1, 2])]);
        session.save_and_export("too early").unwrap();
        assert!(!session.ready_to_export());
        assert!(session.annotation(1).is_none());
    }

    #[test]
    fn next_patient_resets_day_ledger_and_pending_export() {
        let mut session = reviewing(&[("P1", &[1, 2]), ("P2", &[3, 4])]);
        session.next_day("day one").unwrap();
        session.save_and_export("day two").unwrap();
        assert!(session.ready_to_export());

        session.next_patient();
        assert_eq!(session.patient_index(), 1);
        assert_eq!(session.day_index(), 0);
        assert_eq!(session.ledger_len(), 0);
        assert!(!session.ready_to_export());
        assert_eq!(session.current_day(), Some(3));
    }

    #[test]
    fn skipping_without_saving_is_allowed() {
        let mut session = reviewing(&[("P1", &[1, 2]), ("P2", &[1])]);
        session.next_patient();
        assert_eq!(session.phase(), Phase::Reviewing);
        assert_eq!(session.current_patient().unwrap().patient, "P2");
    }

    #[test]
    fn previous_patient_redoes_with_a_clean_slate() {
        let mut session = reviewing(&[("P1", &[1]), ("P2", &[1, 2])]);
        session.next_patient();
        session.next_day("p2 day one").unwrap();

        session.previous_patient();
        assert_eq!(session.patient_index(), 0);
        assert_eq!(session.day_index(), 0);
        assert_eq!(session.ledger_len(), 0);
    }

    #[test]
    fn previous_patient_is_a_noop_on_the_first_patient() {
        let mut session = reviewing(&[("P1", &[1])]);
        session.previous_patient();
        assert_eq!(session.patient_index(), 0);
        assert_eq!(session.phase(), Phase::Reviewing);
    }

    #[test]
    fn advancing_past_the_last_patient_completes_the_session() {
        let mut session = reviewing(&[("P1", &[1]), ("P2", &[1])]);
        session.next_patient();
        assert_eq!(session.phase(), Phase::Reviewing);
        session.next_patient();
        assert_eq!(session.phase(), Phase::AllComplete);
        assert!(session.current_patient().is_none());
    }

    #[test]
    fn empty_table_completes_immediately_after_onboarding() {
        let mut session = session(&[]);
        assert_eq!(session.phase(), Phase::Onboarding);
        session.set_operator_identity("Jane").unwrap();
        assert_eq!(session.phase(), Phase::AllComplete);
    }

    #[test]
    fn revisiting_a_day_overwrites_its_annotation() {
        let mut session = reviewing(&[("P1", &[1, 2, 3])]);
        session.next_day("first draft").unwrap();
        session.previous_day();
        session.next_day("revised summary").unwrap();
        assert_eq!(session.annotation(1), Some("revised summary"));
        assert_eq!(session.day_index(), 1);
    }
}
