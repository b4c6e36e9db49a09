//! Flat tabular projections of a finished case collection.
//!
//! Both logs have one row per record, ordered by case and then by the
//! record's position inside its case.

use serde::Serialize;

use crate::cluster::CaseCollection;

/// Event-log row consumed by process-mining tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLogRow {
    pub case: String,
    pub date: String,
    /// Category name of the record's detected label.
    pub action: String,
}

/// Debug-log row for checking detected labels against train labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLogRow {
    pub date: String,
    pub subject: String,
    pub content: String,
    pub detected_label: String,
    pub train_label: String,
}

/// A topic-model input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusDocument {
    pub id: String,
    pub text: String,
}

/// Project every record onto an event-log row. Dates use `date_format`.
pub fn event_log(cases: &CaseCollection, date_format: &str) -> Vec<EventLogRow> {
    cases
        .iter()
        .flat_map(|case| {
            case.records().iter().map(move |r| EventLogRow {
                case: case.id().to_string(),
                date: r.timestamp().format(date_format).to_string(),
                action: r.detected_label().category().name().to_string(),
            })
        })
        .collect()
}

pub fn debug_log(cases: &CaseCollection, date_format: &str) -> Vec<DebugLogRow> {
    cases
        .records()
        .map(|r| DebugLogRow {
            date: r.timestamp().format(date_format).to_string(),
            subject: r.subject().to_string(),
            content: r.body().to_string(),
            detected_label: r.detected_label().to_string(),
            train_label: r.train_label().unwrap_or_default().to_string(),
        })
        .collect()
}

pub fn corpus(cases: &CaseCollection) -> Vec<CorpusDocument> {
    cases
        .records()
        .map(|r| CorpusDocument {
            id: r.id().to_string(),
            text: r.document(),
        })
        .collect()
}
