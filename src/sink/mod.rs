//! Feature records and the sinks that receive them
//!
//! A [`FeatureRecord`] is the per-document enrichment handed downstream:
//! retained terms by descending weight plus the extractive summary. How the
//! record travels (file, HTTP upload) is the sink's concern.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::domain::{Document, RecordMode, ScoredTerm};
use crate::error::{Error, Result};
use crate::utils::{file_stem, file_type_label, truncate_chars};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Stable document key
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,

    pub terms: Vec<String>,
    pub summary: Vec<String>,
}

impl FeatureRecord {
    /// `terms` must already be ordered by descending weight.
    pub fn build(
        document: &Document,
        terms: &[ScoredTerm],
        summary: Vec<String>,
        mode: RecordMode,
        content_cap_chars: usize,
    ) -> Self {
        let terms = terms.iter().map(|t| t.term.clone()).collect();
        match mode {
            RecordMode::Full => Self {
                id: document.id.to_string(),
                filename: Some(document.filename.clone()),
                content: Some(truncate_chars(&document.content, content_cap_chars).to_string()),
                filetype: Some(file_type_label(&document.filename)),
                terms,
                summary,
            },
            RecordMode::Merge => Self {
                id: file_stem(&document.filename).to_string(),
                filename: None,
                content: None,
                filetype: None,
                terms,
                summary,
            },
        }
    }
}

/// Receives feature records. Failures are per record and must not affect
/// other records.
pub trait FeatureSink: Sync {
    fn submit(&self, record: &FeatureRecord) -> Result<()>;

    /// Flushes anything buffered. Called once after the last record.
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonlSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self { writer: Mutex::new(BufWriter::new(file)) })
    }
}

impl FeatureSink for JsonlSink {
    fn submit(&self, record: &FeatureRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock().map_err(|_| Error::Sink {
            key: record.id.clone(),
            message: "writer lock poisoned".to_string(),
        })?;
        writeln!(writer, "{line}")?;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| Error::Sink {
            key: String::new(),
            message: "writer lock poisoned".to_string(),
        })?;
        writer.flush()?;
        Ok(())
    }
}
