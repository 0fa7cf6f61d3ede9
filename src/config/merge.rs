//! CLI argument merging with config

use crate::domain::{Config, Language, RecordMode};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub input_dir: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub language: Option<Language>,
    pub min_bm25: Option<f64>,
    pub sentences_to_summarize: Option<usize>,
    pub workers: Option<usize>,
    pub batch_rows: Option<usize>,
    pub include_extensions: Option<HashSet<String>>,
    pub exclude_globs: Option<Vec<String>>,
    pub content_cap_chars: Option<usize>,
    pub record_mode: Option<RecordMode>,
}

pub fn merge_cli_with_config(mut base_config: Config, cli: CliOverrides) -> Config {
    if let Some(input_dir) = cli.input_dir {
        base_config.input_dir = Some(input_dir);
    }
    if let Some(working_dir) = cli.working_dir {
        base_config.working_dir = working_dir;
    }

    if let Some(language) = cli.language {
        base_config.language = language;
    }
    if let Some(min_bm25) = cli.min_bm25 {
        base_config.min_bm25 = min_bm25;
    }
    if let Some(sentences) = cli.sentences_to_summarize {
        base_config.sentences_to_summarize = sentences;
    }

    if let Some(workers) = cli.workers {
        base_config.workers = workers;
    }
    if let Some(batch_rows) = cli.batch_rows {
        base_config.batch_rows = batch_rows;
    }

    if let Some(include_extensions) = cli.include_extensions {
        base_config.include_extensions = include_extensions;
    }
    if let Some(exclude_globs) = cli.exclude_globs {
        base_config.exclude_globs = exclude_globs;
    }

    if let Some(content_cap_chars) = cli.content_cap_chars {
        base_config.content_cap_chars = content_cap_chars;
    }
    if let Some(record_mode) = cli.record_mode {
        base_config.record_mode = record_mode;
    }

    base_config
}
