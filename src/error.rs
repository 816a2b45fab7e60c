//! Error taxonomy for the annotation tool.
//!
//! Load problems are fatal (the table is the whole input; there is nothing to
//! review if it cannot be parsed), while transition problems are recoverable:
//! the refused action leaves session state untouched and the message is shown
//! inline so the operator can fix the input and retry.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the record table. All of these abort startup.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The record file could not be opened or read.
    #[error("failed to read record table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The table itself is unparseable: bad CSV, missing required columns, or
    /// a row that does not match the expected schema.
    #[error("malformed record table: {0}")]
    Malformed(#[from] csv::Error),

    /// A `Cycle Day` value that does not coerce to an integer.
    #[error("cycle day '{value}' for patient '{patient}' is not an integer")]
    InvalidCycleDay { patient: String, value: String },

    /// The same cycle day appears twice for one patient, which would break
    /// day-keyed annotation lookups.
    #[error("cycle day {day} appears more than once for patient '{patient}'")]
    DuplicateCycleDay { patient: String, day: i64 },
}

/// Errors raised by refused session transitions. Each one means the action did
/// not happen and the session is exactly as it was before.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The operator tried to start a session with a blank name.
    #[error("please enter your name to begin annotating")]
    InvalidIdentity,

    /// A forward or terminal transition was attempted without a summary for
    /// the day being committed.
    #[error("please enter a summary for cycle day {day} before continuing")]
    EmptyAnnotation { day: i64 },

    /// The annotated table could not be serialized during a save.
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Failure while serializing an export artifact. The writer targets an
/// in-memory buffer, so this is unexpected, but it is propagated rather than
/// panicked on.
#[derive(Debug, Error)]
#[error("failed to serialize annotated table: {0}")]
pub struct ExportError(#[from] csv::Error);
