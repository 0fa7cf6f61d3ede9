//! BM25 scoring shared by the unigram and phrase passes.

use crate::domain::{CorpusAggregates, ScoredTerm, ScoringRow};

pub const K1: f64 = 1.2;
pub const B: f64 = 0.75;

/// Inputs for a single `(doc, term)` score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Inputs {
    pub term_frequency: f64,
    pub document_frequency: f64,
    pub total_documents: f64,
    pub document_word_count: f64,
    pub average_word_count: f64,
}

/// `idf * tf * (k1 + 1) / (tf + k1 * (1 - b + b * dl / avgdl))` with
/// `idf = ln((N - df + 0.5) / (df + 0.5))`.
///
/// Returns `None` for an empty corpus, a non-positive average length, or a
/// non-positive `ln` argument.
pub fn score(inputs: Bm25Inputs) -> Option<f64> {
    let Bm25Inputs {
        term_frequency: tf,
        document_frequency: df,
        total_documents: n,
        document_word_count: dl,
        average_word_count: avgdl,
    } = inputs;

    if n <= 0.0 || !(avgdl > 0.0) {
        return None;
    }

    let ratio = (n - df + 0.5) / (df + 0.5);
    if !(ratio > 0.0) {
        return None;
    }

    let idf = ratio.ln();
    let denom = tf + K1 * (1.0 - B + B * (dl / avgdl));
    let value = idf * ((tf * (K1 + 1.0)) / denom);
    value.is_finite().then_some(value)
}

/// Terms seen in a single document carry no cross-document signal. The upper
/// bound cannot trip under consistent bookkeeping and only guards the `ln`.
pub fn passes_frequency_filter(document_frequency: u64, total_documents: u64) -> bool {
    document_frequency != 1 && document_frequency <= total_documents
}

/// Applies the frequency filter and keeps rows scoring strictly above
/// `min_bm25`. Row order is preserved.
pub fn score_rows(
    rows: &[ScoringRow],
    aggregates: CorpusAggregates,
    min_bm25: f64,
) -> Vec<ScoredTerm> {
    rows.iter()
        .filter(|row| passes_frequency_filter(row.document_frequency, aggregates.total_documents))
        .filter_map(|row| {
            let bm25 = score(inputs_for(row, aggregates))?;
            (bm25 > min_bm25).then(|| ScoredTerm {
                doc_id: row.doc_id,
                term: row.term.clone(),
                bm25,
            })
        })
        .collect()
}

pub fn inputs_for(row: &ScoringRow, aggregates: CorpusAggregates) -> Bm25Inputs {
    Bm25Inputs {
        term_frequency: row.term_frequency as f64,
        document_frequency: row.document_frequency as f64,
        total_documents: aggregates.total_documents as f64,
        document_word_count: row.document_word_count as f64,
        average_word_count: aggregates.average_word_count,
    }
}
