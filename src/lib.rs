//! bm25-enrich: BM25 key terms, key phrases and extractive summaries for a
//! text corpus
//!
//! A run scores stemmed unigrams over the whole corpus, then two-word
//! phrases anchored on the retained unigrams, folds unigrams into the
//! phrases that cover them, and finally emits one feature record per
//! document with its ranked terms and a short summary.

pub mod analyze;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod rank;
pub mod render;
pub mod sink;
pub mod stats;
pub mod store;
pub mod summarize;
pub mod utils;

pub use error::{Error, Result};
