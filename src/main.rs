//! Binary entry point that glues the CSV-backed record store to the TUI.
//! Bootstrapping is deliberately thin: parse the command line, load the
//! record table, construct the session, and drive the Ratatui event loop
//! until the operator exits.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use cycle_annotator::{run_app, App, RecordStore, Session};

/// Walk through per-patient, per-day monitoring records and collect
/// free-text summaries for export.
#[derive(Parser)]
#[command(name = "cycle-annotator", version)]
struct Cli {
    /// Path to the monitoring record table (CSV).
    #[arg(default_value = "data/example_table.csv")]
    table: PathBuf,

    /// Directory where annotated tables are written on download.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

/// Load the record table, then hand control to the event loop. A load failure
/// is fatal and reported on the terminal before the alternate screen opens.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store = RecordStore::load_path(&cli.table)
        .with_context(|| format!("could not load record table {}", cli.table.display()))?;
    let session = Session::new(store);

    let mut app = App::new(session, cli.out_dir);
    run_app(&mut app)
}
