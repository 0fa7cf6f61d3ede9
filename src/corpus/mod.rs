//! Corpus store: enumerates documents and serves their content by id.
//!
//! The analysis phases only ever read through [`CorpusStore`]. Content must
//! not change between calls within a run, since every phase re-fetches it.

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::{DocId, Document};
use crate::error::{Error, Result};
use crate::utils::read_text_file;

pub mod scan;

pub use scan::{scan_text_files, CorpusFile, ScanOptions};

pub trait CorpusStore: Sync {
    /// All document ids, ascending.
    fn document_ids(&self) -> Vec<DocId>;

    fn document(&self, id: DocId) -> Result<Document>;
}

/// Documents held in memory after a single ingestion pass.
#[derive(Debug, Default, Clone)]
pub struct DirectoryCorpus {
    documents: BTreeMap<DocId, Document>,
}

#[derive(Debug, Default, Clone)]
pub struct LoadReport {
    pub files_found: usize,
    pub documents_loaded: usize,
    /// Files that could not be read, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

impl DirectoryCorpus {
    /// Builds a corpus from `(filename, content)` pairs; ids follow input order.
    pub fn from_documents<I, F, C>(documents: I) -> Self
    where
        I: IntoIterator<Item = (F, C)>,
        F: Into<String>,
        C: Into<String>,
    {
        let documents = documents
            .into_iter()
            .enumerate()
            .map(|(idx, (filename, content))| {
                let id = idx as DocId;
                (id, Document { id, filename: filename.into(), content: content.into() })
            })
            .collect();
        Self { documents }
    }

    /// Scans `root` and reads every matching file on `pool`. Unreadable files
    /// are logged and skipped; ids are dense in sorted path order.
    pub fn load(
        root: &Path,
        options: &ScanOptions,
        pool: &rayon::ThreadPool,
        progress: &ProgressBar,
    ) -> Result<(Self, LoadReport)> {
        let files = scan_text_files(root, options)?;
        let mut report = LoadReport { files_found: files.len(), ..LoadReport::default() };
        progress.set_length(files.len() as u64);

        let results: Vec<(CorpusFile, Result<(String, &'static str)>)> = pool.install(|| {
            files
                .into_par_iter()
                .map(|file| {
                    let read = read_text_file(&file.path);
                    progress.inc(1);
                    (file, read)
                })
                .collect()
        });

        let mut documents = BTreeMap::new();
        for (file, read) in results {
            match read {
                Ok((content, encoding)) => {
                    let id = documents.len() as DocId;
                    tracing::debug!(id, path = %file.relative_path, encoding, "ingested");
                    documents.insert(
                        id,
                        Document { id, filename: file.relative_path, content },
                    );
                }
                Err(err) => {
                    tracing::warn!(path = %file.path.display(), "skipping document: {err}");
                    report.skipped.push((file.path, err.to_string()));
                }
            }
        }

        report.documents_loaded = documents.len();
        tracing::info!(
            documents = report.documents_loaded,
            skipped = report.skipped.len(),
            "corpus loaded"
        );
        Ok((Self { documents }, report))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl CorpusStore for DirectoryCorpus {
    fn document_ids(&self) -> Vec<DocId> {
        self.documents.keys().copied().collect()
    }

    fn document(&self, id: DocId) -> Result<Document> {
        self.documents.get(&id).cloned().ok_or(Error::DocumentNotFound(id))
    }
}
