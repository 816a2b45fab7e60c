//! Presentation layer: a thin ratatui adapter over the session state machine.
//! Drawing reads the session; key handling calls transitions and re-reads.
//! No workflow state lives here beyond entry buffers and scroll position.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
