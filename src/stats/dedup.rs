//! Removes unigrams that a retained phrase of the same document already
//! covers. Must run after the phrase pass.

use std::collections::BTreeSet;

use crate::domain::DocId;
use crate::error::Result;
use crate::store::StatsStore;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupReport {
    /// Documents holding at least one retained phrase
    pub documents: usize,
    pub removed: usize,
}

/// `(doc, word)` pairs for every word of every retained phrase.
pub fn subsumed_pairs<'a, I>(phrases_by_document: I) -> Vec<(DocId, String)>
where
    I: IntoIterator<Item = (DocId, &'a [String])>,
{
    let mut pairs = Vec::new();
    for (doc_id, phrases) in phrases_by_document {
        let words: BTreeSet<&str> = phrases.iter().flat_map(|p| p.split_whitespace()).collect();
        pairs.extend(words.into_iter().map(|word| (doc_id, word.to_string())));
    }
    pairs
}

pub fn remove_subsumed_unigrams(store: &mut StatsStore) -> Result<DedupReport> {
    let phrases = store.phrases_by_document()?;
    let pairs = subsumed_pairs(phrases.iter().map(|(&id, p)| (id, p.as_slice())));
    let removed = store.delete_scored_terms(&pairs)?;

    let report = DedupReport { documents: phrases.len(), removed };
    tracing::info!(documents = report.documents, removed = report.removed, "dedup finished");
    Ok(report)
}
