//! Core library surface for the cycle annotation tool.
//!
//! The workflow core (record store, ledger, session state machine, export
//! formatter) is exposed separately from the terminal UI so the `bin` target
//! as well as potential external tooling can reuse the same pieces.

pub mod error;
pub mod export;
pub mod ledger;
pub mod models;
pub mod session;
pub mod store;
pub mod ui;

/// Error taxonomy: fatal load failures versus refused transitions.
pub use error::{ExportError, LoadError, TransitionError};

/// The finished annotated table awaiting download.
pub use export::ExportArtifact;

/// The per-patient day-to-summary annotation map.
pub use ledger::Ledger;

/// The domain types every layer passes around.
pub use models::{CycleRecord, PatientGroup};

/// The navigation state machine owning one operator's session.
pub use session::{Phase, Session};

/// The read-only loaded record table.
pub use store::RecordStore;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
