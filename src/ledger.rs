//! Per-patient annotation ledger: cycle day mapped to the committed summary
//! text. The ledger is scoped to exactly one patient at a time; the session
//! clears it whenever the patient index changes.

use std::collections::BTreeMap;

use crate::error::TransitionError;

#[derive(Debug, Default)]
pub struct Ledger {
    entries: BTreeMap<i64, String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed summary for a day, if one exists.
    pub fn get(&self, day: i64) -> Option<&str> {
        self.entries.get(&day).map(String::as_str)
    }

    /// Commit trimmed summary text for a day. Blank or whitespace-only text
    /// is refused so gated transitions cannot silently skip documenting a
    /// day; re-committing a day overwrites the earlier entry.
    pub fn set(&mut self, day: i64, text: &str) -> Result<(), TransitionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TransitionError::EmptyAnnotation { day });
        }
        self.entries.insert(day, trimmed.to_string());
        Ok(())
    }

    /// Drop every entry. Called on patient transitions.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
