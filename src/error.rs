//! Library error type

use std::path::PathBuf;

use crate::domain::DocId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document could not be read from disk during ingestion.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {0} is not in the corpus")]
    DocumentNotFound(DocId),

    /// Statistics store failure. The open batch transaction is rolled back.
    #[error("statistics store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("sink rejected record {key}: {message}")]
    Sink { key: String, message: String },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unsupported language '{0}' (expected 'en' or 'pt')")]
    UnsupportedLanguage(String),
}
