//! Unigram pass: stemmed term counts and BM25 over the whole corpus.

use rayon::prelude::*;

use super::{score_pass, tally, PassReport, DOCUMENTS_PER_ROUND};
use crate::analyze::{is_valid_term, TermAnalyzer};
use crate::corpus::CorpusStore;
use crate::domain::{DocId, Document, DocumentCounts, Language, Pass};
use crate::error::Result;
use crate::store::StatsStore;

pub struct UnigramPass<'a> {
    corpus: &'a dyn CorpusStore,
    analyzer: TermAnalyzer,
    min_bm25: f64,
}

impl<'a> UnigramPass<'a> {
    pub fn new(corpus: &'a dyn CorpusStore, language: Language, min_bm25: f64) -> Self {
        Self { corpus, analyzer: TermAnalyzer::new(language), min_bm25 }
    }

    /// Every surviving token adds to the word count; only valid terms are
    /// counted as occurrences.
    pub fn count_document(&self, document: &Document) -> DocumentCounts {
        let mut word_count = 0u64;
        let terms = tally(
            self.analyzer
                .tokens(&document.content)
                .inspect(|_| word_count += 1)
                .map(|token| token.text)
                .filter(|term| is_valid_term(term)),
        );
        DocumentCounts { doc_id: document.id, word_count, terms }
    }

    fn count_id(&self, id: DocId) -> Option<DocumentCounts> {
        match self.corpus.document(id) {
            Ok(document) => Some(self.count_document(&document)),
            Err(err) => {
                tracing::warn!(doc_id = id, "skipping document in unigram pass: {err}");
                None
            }
        }
    }

    pub fn run(&self, store: &mut StatsStore, pool: &rayon::ThreadPool) -> Result<PassReport> {
        let ids = self.corpus.document_ids();
        tracing::info!(
            documents = ids.len(),
            language = %self.analyzer.language(),
            "unigram pass started"
        );
        store.clear_pass(Pass::Unigram)?;

        let mut report = PassReport::default();
        for round in ids.chunks(DOCUMENTS_PER_ROUND) {
            let counted: Vec<Option<DocumentCounts>> =
                pool.install(|| round.par_iter().map(|&id| self.count_id(id)).collect());

            let counts: Vec<DocumentCounts> = counted.into_iter().flatten().collect();
            report.skipped += round.len() - counts.len();
            report.documents += counts.len();
            report.occurrences += counts.iter().map(|c| c.terms.len()).sum::<usize>();
            store.write_counts(Pass::Unigram, &counts)?;
        }

        score_pass(store, Pass::Unigram, self.min_bm25, &mut report)?;
        tracing::info!(
            documents = report.documents,
            skipped = report.skipped,
            distinct_terms = report.distinct_terms,
            average_word_count = report.aggregates.average_word_count,
            retained = report.retained,
            "unigram pass finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DirectoryCorpus;
    use crate::domain::TermOccurrence;

    #[test]
    fn word_count_includes_tokens_that_fail_validity() {
        let corpus = DirectoryCorpus::from_documents([("a.txt", "Paid 100 dollars for 2 kiwis")]);
        let pass = UnigramPass::new(&corpus, Language::En, 5.0);
        let counts = pass.count_document(&corpus.document(0).unwrap());

        // paid, 100, dollar, 2, kiwi
        assert_eq!(counts.word_count, 5);
        let terms: Vec<&str> = counts.terms.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["dollar", "kiwi", "paid"]);
    }

    #[test]
    fn repeated_stems_collapse_into_one_count() {
        let corpus =
            DirectoryCorpus::from_documents([("a.txt", "Running runs run. The runner ran.")]);
        let pass = UnigramPass::new(&corpus, Language::En, 5.0);
        let counts = pass.count_document(&corpus.document(0).unwrap());
        assert!(counts.terms.contains(&TermOccurrence { term: "run".to_string(), count: 3 }));
    }

    #[test]
    fn unreadable_documents_are_skipped() {
        struct Flaky(DirectoryCorpus);

        impl CorpusStore for Flaky {
            fn document_ids(&self) -> Vec<DocId> {
                let mut ids = self.0.document_ids();
                ids.push(99);
                ids
            }

            fn document(&self, id: DocId) -> Result<Document> {
                self.0.document(id)
            }
        }

        let corpus = Flaky(DirectoryCorpus::from_documents([
            ("a.txt", "shared words here"),
            ("b.txt", "shared words there"),
        ]));
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let mut store = StatsStore::open_in_memory(10).unwrap();
        let report = UnigramPass::new(&corpus, Language::En, -100.0).run(&mut store, &pool).unwrap();

        assert_eq!(report.documents, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.aggregates.total_documents, 2);
    }
}
