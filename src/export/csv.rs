//! Write projections as delimited text files.
//!
//! Files are named `eventlog_<name>.csv`, `debuglog_<name>.csv` and
//! `corpus_<name>.jsonl` inside the output directory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::projection::{self, CorpusDocument, DebugLogRow, EventLogRow};
use crate::cluster::CaseCollection;
use crate::error::{CaseError, Result};

/// A row that can be written as delimited text.
pub trait CsvRow {
    const HEADER: &'static [&'static str];

    fn cells(&self) -> Vec<&str>;
}

impl CsvRow for EventLogRow {
    const HEADER: &'static [&'static str] = &["Case", "Date", "Action"];

    fn cells(&self) -> Vec<&str> {
        vec![self.case.as_str(), self.date.as_str(), self.action.as_str()]
    }
}

impl CsvRow for DebugLogRow {
    const HEADER: &'static [&'static str] =
        &["Date", "Subject", "Content", "DetectedLabel", "TrainLabel"];

    fn cells(&self) -> Vec<&str> {
        vec![
            self.date.as_str(),
            self.subject.as_str(),
            self.content.as_str(),
            self.detected_label.as_str(),
            self.train_label.as_str(),
        ]
    }
}

/// Write a header line and one line per row.
pub fn write_rows<W: Write, R: CsvRow>(out: &mut W, rows: &[R], separator: char) -> std::io::Result<()> {
    let sep = separator.to_string();
    writeln!(out, "{}", R::HEADER.join(sep.as_str()))?;
    for row in rows {
        let line = row
            .cells()
            .into_iter()
            .map(|c| csv_escape(c, separator))
            .collect::<Vec<_>>()
            .join(sep.as_str());
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn write_file<R: CsvRow>(path: &Path, rows: &[R], separator: char) -> Result<()> {
    let file = File::create(path).map_err(|e| CaseError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_rows(&mut out, rows, separator)
        .and_then(|()| out.flush())
        .map_err(|e| CaseError::io(path, e))
}

/// Write the event log and return its path.
pub fn export_event_log(
    cases: &CaseCollection,
    dir: &Path,
    name: &str,
    separator: char,
    date_format: &str,
) -> Result<PathBuf> {
    let path = dir.join(format!("eventlog_{name}.csv"));
    let rows = projection::event_log(cases, date_format);
    write_file(&path, &rows, separator)?;
    info!(path = %path.display(), rows = rows.len(), "Wrote event log");
    Ok(path)
}

/// Write the debug log and return its path.
pub fn export_debug_log(
    cases: &CaseCollection,
    dir: &Path,
    name: &str,
    separator: char,
    date_format: &str,
) -> Result<PathBuf> {
    let path = dir.join(format!("debuglog_{name}.csv"));
    let rows = projection::debug_log(cases, date_format);
    write_file(&path, &rows, separator)?;
    info!(path = %path.display(), rows = rows.len(), "Wrote debug log");
    Ok(path)
}

/// Write the topic-model corpus, one JSON document per line.
pub fn export_corpus(cases: &CaseCollection, dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(format!("corpus_{name}.jsonl"));
    let docs: Vec<CorpusDocument> = projection::corpus(cases);
    let file = File::create(&path).map_err(|e| CaseError::io(&path, e))?;
    let mut out = BufWriter::new(file);
    for doc in &docs {
        serde_json::to_writer(&mut out, doc)?;
        out.write_all(b"\n").map_err(|e| CaseError::io(&path, e))?;
    }
    out.flush().map_err(|e| CaseError::io(&path, e))?;
    info!(path = %path.display(), documents = docs.len(), "Wrote corpus");
    Ok(path)
}

/// Escape a value (RFC 4180).
///
/// Wraps in double quotes if the value contains the separator, quotes, or
/// newlines.
fn csv_escape(value: &str, separator: char) -> String {
    if value.contains(separator) || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
