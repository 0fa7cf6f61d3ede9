//! End-to-end enrichment run
//!
//! Phases run strictly in order against an explicit [`StatsStore`]:
//! reset, unigram pass, phrase pass, dedup, TSV export, then
//! summarize-and-emit. Only the last phase touches the sink.

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::Path;

use crate::corpus::CorpusStore;
use crate::domain::{Config, DocId, ScoredTerm};
use crate::error::Result;
use crate::render;
use crate::sink::{FeatureRecord, FeatureSink};
use crate::stats::{remove_subsumed_unigrams, DedupReport, PassReport, PhrasePass, UnigramPass};
use crate::store::StatsStore;
use crate::summarize::summarize;

const RECORDS_PER_ROUND: usize = 256;

/// Builds the bounded pool used by every parallel phase.
pub fn worker_pool(workers: usize) -> Result<rayon::ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|idx| format!("bm25-worker-{idx}"))
        .build()?)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmitReport {
    pub records: usize,
    /// Documents that could not be fetched
    pub skipped: usize,
    /// Records the sink rejected
    pub failed: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScoreSummary {
    pub unigram: PassReport,
    pub phrase: PassReport,
    pub dedup: DedupReport,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub documents: usize,
    pub scoring: ScoreSummary,
    /// Rows written to the scored-terms file
    pub scored_terms: usize,
    pub emit: EmitReport,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    corpus: &'a dyn CorpusStore,
    pool: &'a rayon::ThreadPool,
    progress: ProgressBar,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, corpus: &'a dyn CorpusStore, pool: &'a rayon::ThreadPool) -> Self {
        Self { config, corpus, pool, progress: ProgressBar::hidden() }
    }

    /// Progress bar driven during summarize-and-emit.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Rebuilds all statistics from scratch and leaves the final scored
    /// terms in `store`.
    pub fn score(&self, store: &mut StatsStore) -> Result<ScoreSummary> {
        store.reset()?;
        let language = self.config.language;
        let min_bm25 = self.config.min_bm25;

        let unigram = UnigramPass::new(self.corpus, language, min_bm25).run(store, self.pool)?;
        let phrase = PhrasePass::new(self.corpus, language, min_bm25).run(store, self.pool)?;
        let dedup = remove_subsumed_unigrams(store)?;

        store.set_metadata(&[
            ("language", language.to_string()),
            ("min_bm25", min_bm25.to_string()),
            ("documents", unigram.documents.to_string()),
            ("processed_at", chrono::Utc::now().to_rfc3339()),
        ])?;
        Ok(ScoreSummary { unigram, phrase, dedup })
    }

    fn build_record(&self, id: DocId, terms: &[ScoredTerm]) -> Option<FeatureRecord> {
        let document = match self.corpus.document(id) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(doc_id = id, "skipping document during emit: {err}");
                return None;
            }
        };
        let summary = summarize(&document.content, terms, self.config.sentences_to_summarize);
        Some(FeatureRecord::build(
            &document,
            terms,
            summary,
            self.config.record_mode,
            self.config.content_cap_chars,
        ))
    }

    /// Summarizes every document and hands its record to `sink`.
    ///
    /// Records are built in parallel and submitted in document id order.
    /// A rejected record is logged and counted; the run continues.
    pub fn emit(&self, store: &StatsStore, sink: &dyn FeatureSink) -> Result<EmitReport> {
        let ids = self.corpus.document_ids();
        tracing::info!(documents = ids.len(), "summarize and emit started");
        self.progress.set_length(ids.len() as u64);

        let mut report = EmitReport::default();
        for round in ids.chunks(RECORDS_PER_ROUND) {
            let mut work = Vec::with_capacity(round.len());
            for &id in round {
                work.push((id, store.scored_terms_for(id)?));
            }

            let records: Vec<Option<FeatureRecord>> = self.pool.install(|| {
                work.par_iter()
                    .map(|(id, terms)| {
                        let record = self.build_record(*id, terms);
                        self.progress.inc(1);
                        record
                    })
                    .collect()
            });

            for record in records {
                let Some(record) = record else {
                    report.skipped += 1;
                    continue;
                };
                match sink.submit(&record) {
                    Ok(()) => report.records += 1,
                    Err(err) => {
                        tracing::warn!(key = %record.id, "sink rejected record: {err}");
                        report.failed += 1;
                    }
                }
            }
        }

        sink.finish()?;
        self.progress.finish_and_clear();
        tracing::info!(
            records = report.records,
            skipped = report.skipped,
            failed = report.failed,
            "summarize and emit finished"
        );
        Ok(report)
    }

    /// Full run: score, write the scored-terms file to `output`, then emit.
    pub fn run(
        &self,
        store: &mut StatsStore,
        output: &Path,
        sink: &dyn FeatureSink,
    ) -> Result<RunSummary> {
        let scoring = self.score(store)?;
        let scored_terms = render::write_scored_terms(output, &store.all_scored_terms()?)?;
        tracing::info!(rows = scored_terms, path = %output.display(), "wrote scored terms");
        let emit = self.emit(store, sink)?;

        Ok(RunSummary { documents: scoring.unigram.documents, scoring, scored_terms, emit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DirectoryCorpus;
    use crate::error::Error;
    use std::sync::Mutex;

    #[derive(Default)]
    struct VecSink {
        records: Mutex<Vec<FeatureRecord>>,
        reject: Option<String>,
    }

    impl FeatureSink for VecSink {
        fn submit(&self, record: &FeatureRecord) -> Result<()> {
            if self.reject.as_deref() == Some(record.id.as_str()) {
                return Err(Error::Sink { key: record.id.clone(), message: "rejected".to_string() });
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn corpus() -> DirectoryCorpus {
        let mut docs = vec![
            (
                "kiwi-a.txt".to_string(),
                "Kiwi orchards need careful pruning every winter. The growers sell kiwi fruit."
                    .to_string(),
            ),
            (
                "kiwi-b.txt".to_string(),
                "Kiwi orchards flourish near the coast. Pruning keeps kiwi vines healthy."
                    .to_string(),
            ),
        ];
        for idx in 0..8 {
            docs.push((format!("filler-{idx}.txt"), format!("Filler note number {idx} about nothing.")));
        }
        DirectoryCorpus::from_documents(docs)
    }

    fn config() -> Config {
        Config { min_bm25: 0.5, workers: 2, ..Config::default() }
    }

    #[test]
    fn run_writes_output_and_emits_every_document() {
        let corpus = corpus();
        let config = config();
        let pool = worker_pool(config.workers).unwrap();
        let mut store = StatsStore::open_in_memory(config.batch_rows).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("output.txt");
        let sink = VecSink::default();

        let summary = Pipeline::new(&config, &corpus, &pool).run(&mut store, &output, &sink).unwrap();

        assert_eq!(summary.documents, 10);
        assert_eq!(summary.emit, EmitReport { records: 10, skipped: 0, failed: 0 });
        assert!(summary.scored_terms > 0);

        let records = sink.records.lock().unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        assert!(records[0].terms.iter().any(|t| t.contains("kiwi")));

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), summary.scored_terms);
        assert!(written.lines().all(|line| line.split('\t').count() == 3));
        assert_eq!(store.metadata("language").unwrap().as_deref(), Some("en"));
    }

    #[test]
    fn sink_failures_are_counted_not_fatal() {
        let corpus = corpus();
        let config = config();
        let pool = worker_pool(2).unwrap();
        let mut store = StatsStore::open_in_memory(100).unwrap();
        let sink = VecSink { reject: Some("3".to_string()), ..VecSink::default() };

        let pipeline = Pipeline::new(&config, &corpus, &pool);
        pipeline.score(&mut store).unwrap();
        let report = pipeline.emit(&store, &sink).unwrap();

        assert_eq!(report, EmitReport { records: 9, skipped: 0, failed: 1 });
    }

    #[test]
    fn documents_without_terms_still_get_a_summary() {
        let corpus = corpus();
        let config = config();
        let pool = worker_pool(2).unwrap();
        let mut store = StatsStore::open_in_memory(100).unwrap();
        let sink = VecSink::default();

        let pipeline = Pipeline::new(&config, &corpus, &pool);
        pipeline.score(&mut store).unwrap();
        pipeline.emit(&store, &sink).unwrap();

        let records = sink.records.lock().unwrap();
        let filler = records.iter().find(|r| r.filename.as_deref() == Some("filler-0.txt")).unwrap();
        assert_eq!(filler.summary, vec!["Filler note number 0 about nothing".to_string()]);
        assert_eq!(filler.filetype.as_deref(), Some("txt"));
    }

    #[test]
    fn scoring_twice_is_deterministic() {
        let corpus = corpus();
        let config = config();
        let pool = worker_pool(4).unwrap();
        let pipeline = Pipeline::new(&config, &corpus, &pool);

        let mut first = StatsStore::open_in_memory(3).unwrap();
        pipeline.score(&mut first).unwrap();
        let mut second = StatsStore::open_in_memory(1000).unwrap();
        pipeline.score(&mut second).unwrap();

        assert_eq!(first.all_scored_terms().unwrap(), second.all_scored_terms().unwrap());
    }
}
