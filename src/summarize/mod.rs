//! Extractive summaries built from a document's highest-weighted terms.

use crate::domain::ScoredTerm;

/// Terms considered when scoring sentences
pub const TOP_TERMS: usize = 10;

/// A sentence must be longer than this many characters to score.
const MIN_SENTENCE_CHARS: usize = 20;
const MIN_SENTENCE_WORDS: usize = 3;

/// Splits on `!`, `.` and `?` with no abbreviation handling. Empty pieces
/// are kept so indices match the raw split.
pub fn split_sentences(content: &str) -> Vec<&str> {
    content.split(['!', '.', '?']).collect()
}

fn eligible(sentence: &str) -> bool {
    sentence.chars().count() > MIN_SENTENCE_CHARS
        && sentence.split_whitespace().count() >= MIN_SENTENCE_WORDS
}

/// Sum of the weights of `terms` found in the lowercased sentence, or zero
/// when the sentence is too short to be considered.
pub fn sentence_score(sentence: &str, terms: &[ScoredTerm]) -> f64 {
    if !eligible(sentence) {
        return 0.0;
    }
    let lowered = sentence.to_lowercase();
    terms.iter().filter(|t| lowered.contains(t.term.as_str())).map(|t| t.bm25).sum()
}

/// Raw selection over `split`, before trimming and deduplication.
///
/// The best-scoring sentences come back in document order. When nothing
/// scores, the first sentence is repeated once per requested sentence,
/// capped at the number of sentences.
pub fn select<'a>(split: &[&'a str], terms: &[ScoredTerm], sentences: usize) -> Vec<&'a str> {
    let top = &terms[..terms.len().min(TOP_TERMS)];

    let mut matches: Vec<(usize, f64)> = split
        .iter()
        .enumerate()
        .map(|(idx, sentence)| (idx, sentence_score(sentence, top)))
        .filter(|(_, score)| *score > 0.0)
        .collect();
    // stable: equal scores keep document order
    matches.sort_by(|a, b| b.1.total_cmp(&a.1));
    matches.truncate(sentences);
    matches.sort_by_key(|(idx, _)| *idx);

    if matches.is_empty() {
        return match split.first() {
            Some(first) => std::iter::repeat(*first).take(sentences.min(split.len())).collect(),
            None => Vec::new(),
        };
    }
    matches.iter().map(|(idx, _)| split[*idx]).collect()
}

/// Picks up to `sentences` sentences of `content`.
///
/// `terms` must be sorted by descending weight; only the first
/// [`TOP_TERMS`] are used. The result of [`select`] is trimmed and
/// deduplicated in order.
pub fn summarize(content: &str, terms: &[ScoredTerm], sentences: usize) -> Vec<String> {
    let split = split_sentences(content);

    let mut summary: Vec<String> = Vec::new();
    for sentence in select(&split, terms, sentences) {
        let trimmed = sentence.trim();
        if !summary.iter().any(|s| s == trimmed) {
            summary.push(trimmed.to_string());
        }
    }
    summary
}
