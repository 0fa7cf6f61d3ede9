//! Term weighting

pub mod bm25;

pub use bm25::{passes_frequency_filter, score, score_rows, Bm25Inputs};
