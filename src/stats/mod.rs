//! Corpus statistics passes
//!
//! Each pass is an explicit object over a [`CorpusStore`] and a
//! [`StatsStore`]:
//!
//! 1. [`UnigramPass`] counts stemmed terms for every document.
//! 2. [`PhrasePass`] counts surface-form two-word phrases anchored on the
//!    unigrams the first pass retained.
//! 3. [`remove_subsumed_unigrams`] drops unigrams already covered by a
//!    retained phrase of the same document.
//!
//! Per-document counting runs on a rayon pool; the caller's thread is the
//! only writer. Aggregation waits until every document of the pass has been
//! written.
//!
//! [`CorpusStore`]: crate::corpus::CorpusStore

use std::collections::BTreeMap;

use crate::domain::{CorpusAggregates, Pass, TermOccurrence};
use crate::error::Result;
use crate::rank::score_rows;
use crate::store::StatsStore;

pub mod dedup;
pub mod phrase;
pub mod unigram;

pub use dedup::{remove_subsumed_unigrams, DedupReport};
pub use phrase::PhrasePass;
pub use unigram::UnigramPass;

/// Documents handed to the worker pool per write round.
pub(crate) const DOCUMENTS_PER_ROUND: usize = 1024;

/// Outcome of one statistics pass.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PassReport {
    /// Documents counted in this pass
    pub documents: usize,

    /// Documents that could not be fetched
    pub skipped: usize,

    /// `(doc, term)` occurrence rows written
    pub occurrences: usize,

    pub distinct_terms: usize,
    pub aggregates: CorpusAggregates,

    /// `(doc, term)` pairs scoring above the threshold
    pub retained: usize,
}

/// Groups identical strings into occurrence counts, ordered by term.
pub(crate) fn tally<I>(terms: I) -> Vec<TermOccurrence>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for term in terms {
        *counts.entry(term).or_default() += 1;
    }
    counts.into_iter().map(|(term, count)| TermOccurrence { term, count }).collect()
}

/// Aggregate, rebuild document frequencies, score and persist. Must only run
/// once every document of `pass` has been written.
pub(crate) fn score_pass(
    store: &mut StatsStore,
    pass: Pass,
    min_bm25: f64,
    report: &mut PassReport,
) -> Result<()> {
    report.aggregates = store.aggregates(pass)?;
    report.distinct_terms = store.rebuild_document_frequencies(pass)?;

    let rows = store.scoring_rows(pass)?;
    let scored = score_rows(&rows, report.aggregates, min_bm25);
    tracing::debug!(
        pass = pass.as_str(),
        candidates = rows.len(),
        retained = scored.len(),
        "scored pass"
    );
    report.retained = store.insert_scored_terms(&scored)?.rows;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DirectoryCorpus;
    use crate::domain::{Language, ScoredTerm};
    use crate::rank::{score, Bm25Inputs};

    fn pool() -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap()
    }

    /// Runs all three passes and returns the final scored terms.
    fn run_all(corpus: &DirectoryCorpus, min_bm25: f64) -> Vec<ScoredTerm> {
        let pool = pool();
        let mut store = StatsStore::open_in_memory(7).unwrap();
        UnigramPass::new(corpus, Language::En, min_bm25).run(&mut store, &pool).unwrap();
        PhrasePass::new(corpus, Language::En, min_bm25).run(&mut store, &pool).unwrap();
        remove_subsumed_unigrams(&mut store).unwrap();
        store.all_scored_terms().unwrap()
    }

    fn fixture() -> DirectoryCorpus {
        let mut docs = vec![
            (
                "a.txt".to_string(),
                "Data science teams study kiwi harvests. Data science needs careful kiwi sampling."
                    .to_string(),
            ),
            (
                "b.txt".to_string(),
                "Data science reports kiwi prices. Kiwi growers trust data science.".to_string(),
            ),
            ("c.txt".to_string(), "We saw 3 cats near the barn and 3 cats again.".to_string()),
            ("d.txt".to_string(), "Another 3 cats story about the barn.".to_string()),
        ];
        for idx in 0..6 {
            docs.push((
                format!("weather-{idx}.txt"),
                "Weather stations record rainfall totals daily.".to_string(),
            ));
        }
        DirectoryCorpus::from_documents(docs)
    }

    fn terms_of(scored: &[ScoredTerm], doc_id: i64) -> Vec<&str> {
        scored.iter().filter(|t| t.doc_id == doc_id).map(|t| t.term.as_str()).collect()
    }

    #[test]
    fn phrases_subsume_their_component_words() {
        let scored = run_all(&fixture(), -100.0);
        for doc_id in [0, 1] {
            let terms = terms_of(&scored, doc_id);
            assert!(terms.contains(&"data science"), "doc {doc_id}: {terms:?}");
            assert!(!terms.contains(&"data"), "doc {doc_id}: {terms:?}");
            assert!(!terms.contains(&"science"), "doc {doc_id}: {terms:?}");
            assert!(terms.contains(&"kiwi"), "doc {doc_id}: {terms:?}");
        }
    }

    #[test]
    fn phrases_with_numeric_words_are_never_retained() {
        let scored = run_all(&fixture(), -100.0);
        assert!(!scored.iter().any(|t| t.term.contains("3 cats") || t.term.starts_with("3")));
        assert!(terms_of(&scored, 2).contains(&"cat"));
    }

    #[test]
    fn single_document_terms_never_score() {
        let scored = run_all(&fixture(), -100.0);
        for term in ["harvest", "sampl", "grower", "report"] {
            assert!(!scored.iter().any(|t| t.term == term), "{term} should be filtered");
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let corpus = fixture();
        let first = run_all(&corpus, -100.0);
        let second = run_all(&corpus, -100.0);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn rarer_term_outscores_shared_term() {
        let corpus = DirectoryCorpus::from_documents([
            ("a.txt", "The quick brown fox. The fox runs fast."),
            ("b.txt", "The quick brown dog barks loudly."),
        ]);
        let pool = pool();
        let mut store = StatsStore::open_in_memory(100).unwrap();
        let report =
            UnigramPass::new(&corpus, Language::En, -100.0).run(&mut store, &pool).unwrap();

        assert_eq!(report.aggregates.total_documents, 2);
        assert_eq!(report.aggregates.average_word_count, 5.5);

        let quick = store
            .scored_terms_for(0)
            .unwrap()
            .into_iter()
            .find(|t| t.term == "quick")
            .expect("quick is shared by both documents");
        let expected_quick = (0.5_f64 / 2.5).ln() * (1.0 * 2.2)
            / (1.0 + 1.2 * (1.0 - 0.75 + 0.75 * 6.0 / 5.5));
        assert!((quick.bm25 - expected_quick).abs() < 1e-12);

        // fox only occurs in one document, so it is filtered before storage
        assert!(!store.scored_terms_for(0).unwrap().iter().any(|t| t.term == "fox"));
        let fox = score(Bm25Inputs {
            term_frequency: 2.0,
            document_frequency: 1.0,
            total_documents: 2.0,
            document_word_count: 6.0,
            average_word_count: 5.5,
        })
        .unwrap();
        assert!(fox > quick.bm25);
    }

    #[test]
    fn tally_groups_identical_terms() {
        let counts = tally(["b", "a", "b"].map(String::from));
        assert_eq!(
            counts,
            vec![
                TermOccurrence { term: "a".to_string(), count: 1 },
                TermOccurrence { term: "b".to_string(), count: 2 },
            ]
        );
    }
}
