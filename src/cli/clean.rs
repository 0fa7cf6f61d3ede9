//! Clean command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AVERAGES_FILE, FEATURES_FILE, OUTPUT_FILE, STATS_DB_FILE};

#[derive(Args)]
pub struct CleanArgs {
    /// Working directory holding generated artifacts
    #[arg(short, long, value_name = "DIR", default_value = "./work")]
    pub working_dir: PathBuf,
}

pub fn run(args: CleanArgs) -> Result<()> {
    let removed = remove_artifacts(&args.working_dir)?;
    if removed.is_empty() {
        println!("Nothing to clean in {}", args.working_dir.display());
    } else {
        println!("Removed {} file(s) from {}", removed.len(), args.working_dir.display());
        for path in removed {
            println!("  {}", path.display());
        }
    }
    Ok(())
}

/// Deletes the statistics store (with its WAL side files) and every output.
pub(super) fn remove_artifacts(working_dir: &Path) -> Result<Vec<PathBuf>> {
    let wal = format!("{STATS_DB_FILE}-wal");
    let shm = format!("{STATS_DB_FILE}-shm");
    let names = [STATS_DB_FILE, wal.as_str(), shm.as_str(), OUTPUT_FILE, FEATURES_FILE, AVERAGES_FILE];

    let mut removed = Vec::new();
    for name in names {
        let path = working_dir.join(name);
        if path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            tracing::debug!(path = %path.display(), "removed artifact");
            removed.push(path);
        }
    }
    Ok(removed)
}
