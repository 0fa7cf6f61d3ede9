//! Phrase pass: two-word shingles anchored on retained unigrams.
//!
//! Only documents that kept at least one unigram take part. A shingle is a
//! candidate when it contains one of the document's retained unigrams as a
//! substring. Candidates are gathered per unigram, so an occurrence matching
//! two unigrams is counted twice.
//! Word counts are taken from the unigram pass rather than recomputed, but
//! are written under the phrase pass for its documents only, so the phrase
//! aggregates describe the phrase corpus.

use rayon::prelude::*;
use std::collections::BTreeMap;

use super::{score_pass, tally, PassReport, DOCUMENTS_PER_ROUND};
use crate::analyze::ShingleAnalyzer;
use crate::corpus::CorpusStore;
use crate::domain::{DocId, Document, DocumentCounts, Language, Pass};
use crate::error::Result;
use crate::store::StatsStore;

pub struct PhrasePass<'a> {
    corpus: &'a dyn CorpusStore,
    analyzer: ShingleAnalyzer,
    min_bm25: f64,
}

impl<'a> PhrasePass<'a> {
    pub fn new(corpus: &'a dyn CorpusStore, language: Language, min_bm25: f64) -> Self {
        Self { corpus, analyzer: ShingleAnalyzer::new(language), min_bm25 }
    }

    pub fn count_document(
        &self,
        document: &Document,
        unigrams: &[String],
        word_count: u64,
    ) -> DocumentCounts {
        let shingles = self.analyzer.valid_shingles(&document.content);
        let terms = tally(unigrams.iter().flat_map(|unigram| {
            shingles.iter().filter(move |shingle| shingle.contains(unigram.as_str())).cloned()
        }));
        DocumentCounts { doc_id: document.id, word_count, terms }
    }

    fn count_id(&self, id: DocId, unigrams: &[String], word_count: u64) -> Option<DocumentCounts> {
        match self.corpus.document(id) {
            Ok(document) => Some(self.count_document(&document, unigrams, word_count)),
            Err(err) => {
                tracing::warn!(doc_id = id, "skipping document in phrase pass: {err}");
                None
            }
        }
    }

    pub fn run(&self, store: &mut StatsStore, pool: &rayon::ThreadPool) -> Result<PassReport> {
        store.clear_pass(Pass::Phrase)?;
        let unigrams = store.unigrams_by_document()?;
        let word_counts = store.word_counts(Pass::Unigram)?;
        tracing::info!(documents = unigrams.len(), "phrase pass started");

        let work: Vec<(DocId, &[String], u64)> = unigrams
            .iter()
            .map(|(&id, terms)| (id, terms.as_slice(), word_count_of(&word_counts, id)))
            .collect();

        let mut report = PassReport::default();
        for round in work.chunks(DOCUMENTS_PER_ROUND) {
            let counted: Vec<Option<DocumentCounts>> = pool.install(|| {
                round
                    .par_iter()
                    .map(|&(id, terms, word_count)| self.count_id(id, terms, word_count))
                    .collect()
            });

            let counts: Vec<DocumentCounts> = counted.into_iter().flatten().collect();
            report.skipped += round.len() - counts.len();
            report.documents += counts.len();
            report.occurrences += counts.iter().map(|c| c.terms.len()).sum::<usize>();
            store.write_counts(Pass::Phrase, &counts)?;
        }

        score_pass(store, Pass::Phrase, self.min_bm25, &mut report)?;
        tracing::info!(
            documents = report.documents,
            skipped = report.skipped,
            distinct_phrases = report.distinct_terms,
            retained = report.retained,
            "phrase pass finished"
        );
        Ok(report)
    }
}

fn word_count_of(word_counts: &BTreeMap<DocId, u64>, id: DocId) -> u64 {
    word_counts.get(&id).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DirectoryCorpus;
    use crate::domain::{ScoredTerm, TermOccurrence};

    fn unigrams(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn only_shingles_containing_a_retained_unigram_are_counted() {
        let corpus = DirectoryCorpus::from_documents([(
            "a.txt",
            "Solar panels convert light. Solar panels need cleaning. Wind turbines spin.",
        )]);
        let pass = PhrasePass::new(&corpus, Language::En, 5.0);
        let counts =
            pass.count_document(&corpus.document(0).unwrap(), &unigrams(&["panel"]), 11);

        assert_eq!(counts.word_count, 11);
        assert_eq!(
            counts.terms,
            vec![
                TermOccurrence { term: "panels convert".to_string(), count: 1 },
                TermOccurrence { term: "panels need".to_string(), count: 1 },
                TermOccurrence { term: "solar panels".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn an_occurrence_counts_once_per_matching_unigram() {
        let corpus =
            DirectoryCorpus::from_documents([("a.txt", "solar panels solar panels")]);
        let pass = PhrasePass::new(&corpus, Language::En, 5.0);
        let counts = pass.count_document(
            &corpus.document(0).unwrap(),
            &unigrams(&["solar", "panel"]),
            4,
        );
        assert_eq!(
            counts.terms,
            vec![
                TermOccurrence { term: "panels solar".to_string(), count: 2 },
                TermOccurrence { term: "solar panels".to_string(), count: 4 },
            ]
        );
    }

    #[test]
    fn phrase_pass_covers_only_documents_with_retained_unigrams() {
        let corpus = DirectoryCorpus::from_documents([
            ("a.txt", "solar panels work"),
            ("b.txt", "solar panels rest"),
            ("c.txt", "nothing relevant"),
        ]);
        let mut store = StatsStore::open_in_memory(10).unwrap();
        store
            .write_counts(
                Pass::Unigram,
                &[
                    DocumentCounts { doc_id: 0, word_count: 3, terms: vec![] },
                    DocumentCounts { doc_id: 1, word_count: 5, terms: vec![] },
                    DocumentCounts { doc_id: 2, word_count: 2, terms: vec![] },
                ],
            )
            .unwrap();
        store
            .insert_scored_terms(&[
                ScoredTerm { doc_id: 0, term: "solar".to_string(), bm25: 6.0 },
                ScoredTerm { doc_id: 1, term: "panel".to_string(), bm25: 6.0 },
            ])
            .unwrap();

        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let report =
            PhrasePass::new(&corpus, Language::En, -100.0).run(&mut store, &pool).unwrap();

        assert_eq!(report.documents, 2);
        assert_eq!(report.aggregates.total_documents, 2);
        assert_eq!(report.aggregates.average_word_count, 4.0);
        assert_eq!(store.document_frequency(Pass::Phrase, "solar panels").unwrap(), Some(2));
    }
}
