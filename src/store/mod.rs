//! SQLite-backed statistics store
//!
//! Holds the scratch tables for both passes plus the persisted
//! `scored_terms` table. All scratch state is rebuilt per run.
//!
//! Writes are grouped into transactions of roughly `batch_rows` rows. A
//! batch only closes on an item boundary, so one document's rows always
//! commit together; a failure rolls back the open batch and leaves earlier
//! batches committed. Inserts use `OR REPLACE`, so replaying a batch over
//! the same documents is harmless.

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::domain::{CorpusAggregates, DocId, DocumentCounts, Pass, ScoredTerm, ScoringRow};
use crate::error::Result;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS term_occurrences (
        doc_id INTEGER NOT NULL,
        term TEXT NOT NULL,
        count INTEGER NOT NULL,
        PRIMARY KEY(doc_id, term)
    );

    CREATE TABLE IF NOT EXISTS phrase_occurrences (
        doc_id INTEGER NOT NULL,
        term TEXT NOT NULL,
        count INTEGER NOT NULL,
        PRIMARY KEY(doc_id, term)
    );

    CREATE TABLE IF NOT EXISTS word_counts (
        pass TEXT NOT NULL,
        doc_id INTEGER NOT NULL,
        word_count INTEGER NOT NULL,
        PRIMARY KEY(pass, doc_id)
    );

    CREATE TABLE IF NOT EXISTS document_frequencies (
        pass TEXT NOT NULL,
        term TEXT NOT NULL,
        df INTEGER NOT NULL,
        PRIMARY KEY(pass, term)
    );

    CREATE TABLE IF NOT EXISTS scored_terms (
        doc_id INTEGER NOT NULL,
        term TEXT NOT NULL,
        bm25 REAL NOT NULL,
        PRIMARY KEY(doc_id, term)
    );

    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_term_occurrences_term ON term_occurrences(term);
    CREATE INDEX IF NOT EXISTS idx_phrase_occurrences_term ON phrase_occurrences(term);
    CREATE INDEX IF NOT EXISTS idx_scored_terms_term ON scored_terms(term);
";

const DROP_ALL: &str = "
    DROP TABLE IF EXISTS term_occurrences;
    DROP TABLE IF EXISTS phrase_occurrences;
    DROP TABLE IF EXISTS word_counts;
    DROP TABLE IF EXISTS document_frequencies;
    DROP TABLE IF EXISTS scored_terms;
    DROP TABLE IF EXISTS metadata;
";

fn occurrence_table(pass: Pass) -> &'static str {
    match pass {
        Pass::Unigram => "term_occurrences",
        Pass::Phrase => "phrase_occurrences",
    }
}

/// Rows written by a batched operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub rows: usize,
    pub batches: usize,
}

pub struct StatsStore {
    conn: Connection,
    batch_rows: usize,
}

impl StatsStore {
    pub fn open(path: &Path, batch_rows: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        Self::with_connection(conn, batch_rows)
    }

    pub fn open_in_memory(batch_rows: usize) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, batch_rows)
    }

    fn with_connection(conn: Connection, batch_rows: usize) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, batch_rows: batch_rows.max(1) })
    }

    /// Drops and recreates every table.
    pub fn reset(&mut self) -> Result<()> {
        self.conn.execute_batch(DROP_ALL)?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Clears one pass's occurrences, word counts and document frequencies.
    pub fn clear_pass(&mut self, pass: Pass) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", occurrence_table(pass)), [])?;
        tx.execute("DELETE FROM word_counts WHERE pass = ?1", params![pass.as_str()])?;
        tx.execute("DELETE FROM document_frequencies WHERE pass = ?1", params![pass.as_str()])?;
        tx.commit()?;
        Ok(())
    }

    /// Runs `write` for each item, committing whenever the open transaction
    /// holds at least `batch_rows` rows.
    fn write_batched<T, F>(&mut self, items: &[T], mut write: F) -> Result<BatchReport>
    where
        F: FnMut(&Transaction<'_>, &T) -> rusqlite::Result<usize>,
    {
        let mut report = BatchReport::default();
        let mut tx = self.conn.transaction()?;
        let mut in_batch = 0usize;

        for item in items {
            in_batch += write(&tx, item)?;
            if in_batch >= self.batch_rows {
                tx.commit()?;
                report.rows += in_batch;
                report.batches += 1;
                tracing::debug!(rows = in_batch, total = report.rows, "committed batch");
                in_batch = 0;
                tx = self.conn.transaction()?;
            }
        }

        tx.commit()?;
        if in_batch > 0 {
            report.rows += in_batch;
            report.batches += 1;
            tracing::debug!(rows = in_batch, total = report.rows, "committed batch");
        }
        Ok(report)
    }

    /// Writes per-document occurrence rows and word counts for `pass`.
    pub fn write_counts(&mut self, pass: Pass, counts: &[DocumentCounts]) -> Result<BatchReport> {
        let insert_occurrence = format!(
            "INSERT OR REPLACE INTO {} (doc_id, term, count) VALUES (?1, ?2, ?3)",
            occurrence_table(pass)
        );
        self.write_batched(counts, |tx, doc| {
            let mut occurrences = tx.prepare_cached(&insert_occurrence)?;
            for term in &doc.terms {
                occurrences.execute(params![doc.doc_id, term.term, term.count as i64])?;
            }
            tx.prepare_cached(
                "INSERT OR REPLACE INTO word_counts (pass, doc_id, word_count) VALUES (?1, ?2, ?3)",
            )?
            .execute(params![pass.as_str(), doc.doc_id, doc.word_count as i64])?;
            Ok(doc.terms.len() + 1)
        })
    }

    pub fn word_counts(&self, pass: Pass) -> Result<BTreeMap<DocId, u64>> {
        let mut stmt =
            self.conn.prepare("SELECT doc_id, word_count FROM word_counts WHERE pass = ?1")?;
        let rows = stmt.query_map(params![pass.as_str()], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut map = BTreeMap::new();
        for row in rows {
            let (doc_id, count) = row?;
            map.insert(doc_id, count.max(0) as u64);
        }
        Ok(map)
    }

    /// Total document count and mean word count over the pass's word counts.
    pub fn aggregates(&self, pass: Pass) -> Result<CorpusAggregates> {
        let (count, average) = self.conn.query_row(
            "SELECT COUNT(*), AVG(word_count) FROM word_counts WHERE pass = ?1",
            params![pass.as_str()],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<f64>>(1)?)),
        )?;
        Ok(CorpusAggregates {
            total_documents: count.max(0) as u64,
            average_word_count: average.unwrap_or(0.0),
        })
    }

    /// Materializes per-term document frequencies for `pass`. Returns the
    /// number of distinct terms.
    pub fn rebuild_document_frequencies(&mut self, pass: Pass) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM document_frequencies WHERE pass = ?1", params![pass.as_str()])?;
        let inserted = tx.execute(
            &format!(
                "INSERT INTO document_frequencies (pass, term, df)
                 SELECT ?1, term, COUNT(*) FROM {} GROUP BY term",
                occurrence_table(pass)
            ),
            params![pass.as_str()],
        )?;
        tx.commit()?;
        Ok(inserted)
    }

    pub fn document_frequency(&self, pass: Pass, term: &str) -> Result<Option<u64>> {
        let df = self
            .conn
            .query_row(
                "SELECT df FROM document_frequencies WHERE pass = ?1 AND term = ?2",
                params![pass.as_str(), term],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(df.map(|v| v.max(0) as u64))
    }

    /// Every `(doc, term)` occurrence joined with its document frequency and
    /// the document's word count, ordered by doc id then term.
    pub fn scoring_rows(&self, pass: Pass) -> Result<Vec<ScoringRow>> {
        let sql = format!(
            "
            SELECT o.doc_id, o.term, o.count, f.df, w.word_count
            FROM {table} o
            JOIN document_frequencies f ON f.term = o.term AND f.pass = ?1
            JOIN word_counts w ON w.doc_id = o.doc_id AND w.pass = ?1
            ORDER BY o.doc_id, o.term
            ",
            table = occurrence_table(pass)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pass.as_str()], |row| {
            Ok(ScoringRow {
                doc_id: row.get(0)?,
                term: row.get(1)?,
                term_frequency: row.get::<_, i64>(2)?.max(0) as u64,
                document_frequency: row.get::<_, i64>(3)?.max(0) as u64,
                document_word_count: row.get::<_, i64>(4)?.max(0) as u64,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn insert_scored_terms(&mut self, terms: &[ScoredTerm]) -> Result<BatchReport> {
        self.write_batched(terms, |tx, term| {
            tx.prepare_cached(
                "INSERT OR REPLACE INTO scored_terms (doc_id, term, bm25) VALUES (?1, ?2, ?3)",
            )?
            .execute(params![term.doc_id, term.term, term.bm25])
        })
    }

    pub fn documents_with_scored_terms(&self) -> Result<Vec<DocId>> {
        let mut stmt =
            self.conn.prepare("SELECT DISTINCT doc_id FROM scored_terms ORDER BY doc_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Scored terms for one document, highest weight first.
    pub fn scored_terms_for(&self, doc_id: DocId) -> Result<Vec<ScoredTerm>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT doc_id, term, bm25 FROM scored_terms WHERE doc_id = ?1
             ORDER BY bm25 DESC, term ASC",
        )?;
        let rows = stmt.query_map(params![doc_id], scored_term_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Single-word scored terms grouped by document.
    pub fn unigrams_by_document(&self) -> Result<BTreeMap<DocId, Vec<String>>> {
        self.terms_by_document("instr(term, ' ') = 0")
    }

    /// Multi-word scored terms grouped by document.
    pub fn phrases_by_document(&self) -> Result<BTreeMap<DocId, Vec<String>>> {
        self.terms_by_document("instr(term, ' ') > 0")
    }

    fn terms_by_document(&self, predicate: &str) -> Result<BTreeMap<DocId, Vec<String>>> {
        let sql = format!(
            "SELECT doc_id, term FROM scored_terms WHERE {predicate} ORDER BY doc_id, term"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows =
            stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        let mut grouped: BTreeMap<DocId, Vec<String>> = BTreeMap::new();
        for row in rows {
            let (doc_id, term) = row?;
            grouped.entry(doc_id).or_default().push(term);
        }
        Ok(grouped)
    }

    /// Deletes the given `(doc, term)` rows. Returns how many existed.
    pub fn delete_scored_terms(&mut self, pairs: &[(DocId, String)]) -> Result<usize> {
        let report = self.write_batched(pairs, |tx, (doc_id, term)| {
            tx.prepare_cached("DELETE FROM scored_terms WHERE doc_id = ?1 AND term = ?2")?
                .execute(params![doc_id, term])
        })?;
        Ok(report.rows)
    }

    /// Every scored term, ordered by doc id ascending then weight descending.
    pub fn all_scored_terms(&self) -> Result<Vec<ScoredTerm>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, term, bm25 FROM scored_terms ORDER BY doc_id ASC, bm25 DESC, term ASC",
        )?;
        let rows = stmt.query_map([], scored_term_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Mean weight of each distinct term across the documents that retain it.
    pub fn term_averages(&self) -> Result<Vec<(String, f64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT term, AVG(bm25) FROM scored_terms GROUP BY term ORDER BY term")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_metadata(&mut self, entries: &[(&str, String)]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn metadata(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?)
    }
}

fn scored_term_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScoredTerm> {
    Ok(ScoredTerm { doc_id: row.get(0)?, term: row.get(1)?, bm25: row.get(2)? })
}
