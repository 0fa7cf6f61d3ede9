//! Core domain types and models
//!
//! Defines the corpus document, the per-pass statistics rows, scored terms,
//! and the run configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Opaque document identifier, stable for the duration of one run.
pub type DocId = i64;

/// Language selector for the analysis pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Pt,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pt => "pt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "pt" | "portuguese" => Ok(Language::Pt),
            other => Err(Error::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Shape of the emitted feature records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordMode {
    /// Full record keyed by document id
    #[default]
    Full,
    /// Terms and summary only, keyed by the filename without its extension,
    /// for enriching records a downstream index already holds
    Merge,
}

impl FromStr for RecordMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(RecordMode::Full),
            "merge" => Ok(RecordMode::Merge),
            other => Err(Error::Config(format!(
                "unknown record mode '{other}' (expected 'full' or 'merge')"
            ))),
        }
    }
}

/// Which statistics pass a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Unigram,
    Phrase,
}

impl Pass {
    pub fn as_str(self) -> &'static str {
        match self {
            Pass::Unigram => "unigram",
            Pass::Phrase => "phrase",
        }
    }
}

/// A document as held by the corpus store. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocId,

    /// Path relative to the input root, `/`-separated
    pub filename: String,

    pub content: String,
}

/// Per-document accumulation produced by one pass: distinct term counts plus
/// the document's normalized token count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCounts {
    pub doc_id: DocId,
    pub word_count: u64,
    pub terms: Vec<TermOccurrence>,
}

/// Count of a normalized term (or phrase) within one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermOccurrence {
    pub term: String,
    pub count: u64,
}

/// Corpus-wide scalars for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorpusAggregates {
    pub total_documents: u64,
    pub average_word_count: f64,
}

/// Everything the scorer needs for one `(doc, term)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRow {
    pub doc_id: DocId,
    pub term: String,
    pub term_frequency: u64,
    pub document_frequency: u64,
    pub document_word_count: u64,
}

/// A retained term or space-joined two-word phrase with its BM25 weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTerm {
    pub doc_id: DocId,
    pub term: String,
    pub bm25: f64,
}

impl ScoredTerm {
    pub fn is_phrase(&self) -> bool {
        self.term.contains(' ')
    }
}

/// Custom deserializer for extensions: normalizes to dot-prefixed lowercase.
///
/// Accepts a comma-separated string or an array.
fn deserialize_extensions<'de, D>(deserializer: D) -> std::result::Result<HashSet<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct ExtensionsVisitor;

    impl<'de> Visitor<'de> for ExtensionsVisitor {
        type Value = HashSet<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or array of extensions")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.split(',').filter_map(normalize_extension).collect())
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut result = HashSet::new();
            while let Some(ext) = seq.next_element::<String>()? {
                if let Some(normalized) = normalize_extension(&ext) {
                    result.insert(normalized);
                }
            }
            Ok(result)
        }
    }

    deserializer.deserialize_any(ExtensionsVisitor)
}

/// Custom deserializer for globs: accepts a comma-separated string or an array.
fn deserialize_globs<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct GlobsVisitor;

    impl<'de> Visitor<'de> for GlobsVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or array of glob patterns")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect())
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut result = Vec::new();
            while let Some(glob) = seq.next_element::<String>()? {
                let trimmed = glob.trim();
                if !trimmed.is_empty() {
                    result.push(trimmed.to_string());
                }
            }
            Ok(result)
        }
    }

    deserializer.deserialize_any(GlobsVisitor)
}

pub fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('.') {
        Some(trimmed)
    } else {
        Some(format!(".{trimmed}"))
    }
}

/// Main configuration for bm25-enrich
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the text corpus
    #[serde(default, alias = "input")]
    pub input_dir: Option<PathBuf>,

    /// Scratch directory for the statistics store and generated outputs
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    #[serde(default)]
    pub language: Language,

    /// Only `(doc, term)` pairs scoring strictly above this are retained
    #[serde(default = "default_min_bm25")]
    pub min_bm25: f64,

    #[serde(default = "default_sentences_to_summarize", alias = "sentences")]
    pub sentences_to_summarize: usize,

    /// Worker threads for the parallel phases
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Rows per statistics-store transaction
    #[serde(default = "default_batch_rows")]
    pub batch_rows: usize,

    #[serde(
        default = "default_include_extensions",
        alias = "include_ext",
        deserialize_with = "deserialize_extensions"
    )]
    pub include_extensions: HashSet<String>,

    #[serde(default, alias = "exclude_glob", deserialize_with = "deserialize_globs")]
    pub exclude_globs: Vec<String>,

    /// Content is cut to this many characters in emitted feature records
    #[serde(default = "default_content_cap_chars")]
    pub content_cap_chars: usize,

    #[serde(default)]
    pub record_mode: RecordMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: None,
            working_dir: default_working_dir(),
            language: Language::En,
            min_bm25: default_min_bm25(),
            sentences_to_summarize: default_sentences_to_summarize(),
            workers: default_workers(),
            batch_rows: default_batch_rows(),
            include_extensions: default_include_extensions(),
            exclude_globs: Vec::new(),
            content_cap_chars: default_content_cap_chars(),
            record_mode: RecordMode::Full,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !self.min_bm25.is_finite() {
            return Err(Error::Config(format!("min_bm25 must be finite, got {}", self.min_bm25)));
        }
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if self.batch_rows == 0 {
            return Err(Error::Config("batch_rows must be at least 1".to_string()));
        }
        if self.sentences_to_summarize == 0 {
            return Err(Error::Config("sentences_to_summarize must be at least 1".to_string()));
        }
        if self.include_extensions.is_empty() {
            return Err(Error::Config("include_extensions must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn stats_db_path(&self) -> PathBuf {
        self.working_dir.join(STATS_DB_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.working_dir.join(OUTPUT_FILE)
    }

    pub fn features_path(&self) -> PathBuf {
        self.working_dir.join(FEATURES_FILE)
    }

    pub fn averages_path(&self) -> PathBuf {
        self.working_dir.join(AVERAGES_FILE)
    }
}

pub const STATS_DB_FILE: &str = "stats.sqlite";
pub const OUTPUT_FILE: &str = "output.txt";
pub const FEATURES_FILE: &str = "features.jsonl";
pub const AVERAGES_FILE: &str = "term_averages.txt";

// Default value functions for serde
fn default_working_dir() -> PathBuf {
    PathBuf::from("./work")
}

fn default_min_bm25() -> f64 {
    5.0
}

fn default_sentences_to_summarize() -> usize {
    3
}

fn default_workers() -> usize {
    8
}

fn default_batch_rows() -> usize {
    50_000
}

fn default_content_cap_chars() -> usize {
    200_000
}

pub fn default_include_extensions() -> HashSet<String> {
    HashSet::from([".txt".to_string()])
}
