//! Tab-separated outputs over the scored terms.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::domain::ScoredTerm;
use crate::error::Result;

/// `doc_id<TAB>term<TAB>bm25`, one line per row, in the given order.
pub fn format_scored_terms<W: Write>(writer: &mut W, rows: &[ScoredTerm]) -> io::Result<()> {
    for row in rows {
        writeln!(writer, "{}\t{}\t{}", row.doc_id, row.term, row.bm25)?;
    }
    Ok(())
}

/// `term<TAB>avg_bm25`, one line per distinct term.
pub fn format_term_averages<W: Write>(writer: &mut W, rows: &[(String, f64)]) -> io::Result<()> {
    for (term, average) in rows {
        writeln!(writer, "{term}\t{average}")?;
    }
    Ok(())
}

/// Writes `output.txt`. Rows are expected ordered by doc id, then weight
/// descending. Returns the number of lines written.
pub fn write_scored_terms(path: &Path, rows: &[ScoredTerm]) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    format_scored_terms(&mut writer, rows)?;
    writer.flush()?;
    Ok(rows.len())
}

pub fn write_term_averages(path: &Path, rows: &[(String, f64)]) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    format_term_averages(&mut writer, rows)?;
    writer.flush()?;
    Ok(rows.len())
}
