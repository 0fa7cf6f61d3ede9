//! Command-line interface for bm25-enrich
//!
//! Provides `process`, `terms`, `averages`, and `clean` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod averages;
mod clean;
mod process;
mod terms;
mod utils;

/// Enrich a text corpus with BM25 key terms, phrases and extractive summaries
#[derive(Parser)]
#[command(name = "bm25-enrich")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a corpus, write output.txt and emit feature records
    Process(Box<process::ProcessArgs>),

    /// Re-export scored terms from an existing working directory
    Terms(terms::TermsArgs),

    /// Write the average score of every retained term
    Averages(averages::AveragesArgs),

    /// Remove generated artifacts from a working directory
    Clean(clean::CleanArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Process(args) => process::run(*args),
        Commands::Terms(args) => terms::run(args),
        Commands::Averages(args) => averages::run(args),
        Commands::Clean(args) => clean::run(args),
    }
}
