//! Import of detected labels produced by the external topic labeler.
//!
//! The file has one row per message with `Message-ID` and `DetectedLabel`
//! columns.

use std::path::Path;

use tracing::{info, warn};

use super::table::Table;
use crate::cluster::CaseCollection;
use crate::error::{CaseError, Result};
use crate::model::label::DetectedLabel;

pub const ID_COLUMN: &str = "Message-ID";
pub const LABEL_COLUMN: &str = "DetectedLabel";

/// Read `(record id, label)` pairs from a label file on disk.
pub fn read_labels(path: &Path, separator: char) -> Result<Vec<(String, DetectedLabel)>> {
    let text = std::fs::read_to_string(path).map_err(|e| CaseError::io(path, e))?;
    let labels = parse_labels(&text, separator)?;
    info!(path = %path.display(), count = labels.len(), "Loaded detected labels");
    Ok(labels)
}

pub fn parse_labels(text: &str, separator: char) -> Result<Vec<(String, DetectedLabel)>> {
    let table = Table::parse(text, separator)?;
    let missing = |field: &'static str| CaseError::MissingField {
        field,
        line: Some(1),
    };
    let id_col = table.column(ID_COLUMN).ok_or_else(|| missing(ID_COLUMN))?;
    let label_col = table.column(LABEL_COLUMN).ok_or_else(|| missing(LABEL_COLUMN))?;

    table
        .rows()
        .map(|(line, cells)| {
            let label = cells[label_col].parse::<DetectedLabel>().inspect_err(|_| {
                warn!(line, value = %cells[label_col], "Invalid detected label");
            })?;
            Ok((cells[id_col].trim().to_string(), label))
        })
        .collect()
}

/// Outcome of applying a label file to a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelImport {
    pub applied: usize,
    /// Ids present in the file but not in any case.
    pub unknown: Vec<String>,
}

/// Set every listed label on the matching record. Unknown ids are reported,
/// not treated as errors.
pub fn apply_labels<I>(cases: &mut CaseCollection, labels: I) -> LabelImport
where
    I: IntoIterator<Item = (String, DetectedLabel)>,
{
    let mut report = LabelImport::default();
    for (id, label) in labels {
        match cases.set_detected_label(&id, label) {
            Ok(()) => report.applied += 1,
            Err(_) => {
                warn!(id = %id, "Label for unknown message id");
                report.unknown.push(id);
            }
        }
    }
    report
}
