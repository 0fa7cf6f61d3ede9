//! Process command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use super::clean::remove_artifacts;
use super::utils::{parse_csv, progress_bar};
use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::corpus::{DirectoryCorpus, ScanOptions};
use crate::domain::{normalize_extension, Language, RecordMode};
use crate::pipeline::{worker_pool, Pipeline};
use crate::sink::JsonlSink;
use crate::store::StatsStore;
use crate::utils::format_with_commas;

#[derive(Args)]
pub struct ProcessArgs {
    /// Root directory of the text corpus
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Directory for the statistics store and generated outputs
    #[arg(short, long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Path to config file (defaults to bm25-enrich.toml in the input directory)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Analysis language (en, pt)
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<Language>,

    /// Keep terms scoring strictly above this BM25 weight
    #[arg(long, value_name = "SCORE", allow_negative_numbers = true)]
    pub min_bm25: Option<f64>,

    /// Sentences per summary
    #[arg(short, long, value_name = "N")]
    pub sentences: Option<usize>,

    /// Worker threads for the parallel phases
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Rows per statistics-store transaction
    #[arg(long, value_name = "ROWS")]
    pub batch_rows: Option<usize>,

    /// Include only these extensions (comma-separated)
    #[arg(long, value_name = "EXTS")]
    pub include_ext: Option<String>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,

    /// Follow symbolic links when scanning
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Cap record content at this many characters
    #[arg(long, value_name = "CHARS")]
    pub content_cap: Option<usize>,

    /// Feature record shape (full, merge)
    #[arg(long, value_name = "MODE")]
    pub record_mode: Option<RecordMode>,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: ProcessArgs) -> Result<()> {
    let file_config = load_config(args.config.as_deref(), args.input.as_deref())?;
    let include_ext = parse_csv(&args.include_ext)
        .map(|v| v.iter().filter_map(|ext| normalize_extension(ext)).collect());

    let cli_overrides = CliOverrides {
        input_dir: args.input.clone(),
        working_dir: args.working_dir.clone(),
        language: args.language,
        min_bm25: args.min_bm25,
        sentences_to_summarize: args.sentences,
        workers: args.workers,
        batch_rows: args.batch_rows,
        include_extensions: include_ext,
        exclude_globs: parse_csv(&args.exclude_glob),
        content_cap_chars: args.content_cap,
        record_mode: args.record_mode,
    };
    let config = merge_cli_with_config(file_config, cli_overrides);
    config.validate()?;

    let Some(input) = config.input_dir.clone() else {
        anyhow::bail!("--input must be specified (or set input_dir in the config file)");
    };

    fs::create_dir_all(&config.working_dir).with_context(|| {
        format!("Failed to create working directory {}", config.working_dir.display())
    })?;
    remove_artifacts(&config.working_dir)?;

    let pool = worker_pool(config.workers)?;
    let scan = ScanOptions {
        include_extensions: config.include_extensions.clone(),
        exclude_globs: config.exclude_globs.clone(),
        follow_symlinks: args.follow_symlinks,
    };
    let loading = progress_bar("loading", args.quiet);
    let (corpus, load) = DirectoryCorpus::load(&input, &scan, &pool, &loading)?;
    loading.finish_and_clear();

    let db_path = config.stats_db_path();
    let mut store = StatsStore::open(&db_path, config.batch_rows)
        .with_context(|| format!("Failed to open SQLite database at {}", db_path.display()))?;
    let features_path = config.features_path();
    let sink = JsonlSink::create(&features_path)
        .with_context(|| format!("Failed to create {}", features_path.display()))?;

    let output_path = config.output_path();
    let summary = Pipeline::new(&config, &corpus, &pool)
        .with_progress(progress_bar("emitting", args.quiet))
        .run(&mut store, &output_path, &sink)?;

    println!("Processed {} in {}", input.display(), config.working_dir.display());
    println!("  documents: {}", format_with_commas(summary.documents as u64));
    if !load.skipped.is_empty() {
        println!("  unreadable files: {}", load.skipped.len());
    }
    println!(
        "  terms retained: {} (unigram pass)",
        format_with_commas(summary.scoring.unigram.retained as u64)
    );
    println!(
        "  phrases retained: {} (phrase pass)",
        format_with_commas(summary.scoring.phrase.retained as u64)
    );
    println!(
        "  unigrams folded into phrases: {}",
        format_with_commas(summary.scoring.dedup.removed as u64)
    );
    println!("  scored terms written: {}", format_with_commas(summary.scored_terms as u64));
    println!("  feature records: {}", format_with_commas(summary.emit.records as u64));
    if summary.emit.failed > 0 {
        println!("  records rejected: {}", summary.emit.failed);
    }
    println!("  output: {}", output_path.display());
    println!("  features: {}", features_path.display());

    Ok(())
}
