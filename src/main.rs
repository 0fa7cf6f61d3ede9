//! bm25-enrich: enrich a text corpus with BM25 key terms, key phrases and
//! extractive summaries.

use anyhow::Result;

fn main() -> Result<()> {
    bm25_enrich::cli::run()
}
