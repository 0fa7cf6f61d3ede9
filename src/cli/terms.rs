//! Terms command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::domain::{OUTPUT_FILE, STATS_DB_FILE};
use crate::render::write_scored_terms;
use crate::store::StatsStore;

#[derive(Args)]
pub struct TermsArgs {
    /// Working directory of a previous `process` run
    #[arg(short, long, value_name = "DIR", default_value = "./work")]
    pub working_dir: PathBuf,

    /// Destination file (defaults to output.txt in the working directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: TermsArgs) -> Result<()> {
    let store = open_existing_store(&args.working_dir)?;
    let output = args.output.unwrap_or_else(|| args.working_dir.join(OUTPUT_FILE));

    let rows = store.all_scored_terms()?;
    let written = write_scored_terms(&output, &rows)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {written} scored terms to {}", output.display());
    Ok(())
}

/// Opens the statistics store of a finished run without resetting it.
pub(super) fn open_existing_store(working_dir: &Path) -> Result<StatsStore> {
    let db_path = working_dir.join(STATS_DB_FILE);
    if !db_path.is_file() {
        anyhow::bail!(
            "No statistics store at {} (run `bm25-enrich process` first)",
            db_path.display()
        );
    }
    StatsStore::open(&db_path, 1)
        .with_context(|| format!("Failed to open SQLite database at {}", db_path.display()))
}
