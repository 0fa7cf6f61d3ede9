//! Averages command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::terms::open_existing_store;
use crate::domain::AVERAGES_FILE;
use crate::render::write_term_averages;

#[derive(Args)]
pub struct AveragesArgs {
    /// Working directory of a previous `process` run
    #[arg(short, long, value_name = "DIR", default_value = "./work")]
    pub working_dir: PathBuf,

    /// Destination file (defaults to term_averages.txt in the working directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: AveragesArgs) -> Result<()> {
    let store = open_existing_store(&args.working_dir)?;
    let output = args.output.unwrap_or_else(|| args.working_dir.join(AVERAGES_FILE));

    let rows = store.term_averages()?;
    let written = write_term_averages(&output, &rows)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {written} term averages to {}", output.display());
    Ok(())
}
