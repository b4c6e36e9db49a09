//! Cases: clusters of records that form one interaction.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::label::DetectedLabel;
use super::record::Record;

/// Time span covered by a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseDuration {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub elapsed_seconds: i64,
}

/// Why a case counts as successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaseOutcome {
    Successful,
    /// A member record was labeled as a decline.
    Declined { record_id: String },
}

impl CaseOutcome {
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Successful)
    }
}

/// A cluster of records, identified by the id of its root record.
///
/// `actors` is always the union of sender and recipient over `records`;
/// it is only ever touched by [`Case::add`]. Cases are never merged.
#[derive(Debug, Clone)]
pub struct Case {
    id: String,
    records: Vec<Record>,
    actors: BTreeSet<String>,
}

impl Case {
    /// Start a new case rooted at `root`.
    pub fn new(root: Record) -> Self {
        let mut case = Self {
            id: root.id().to_string(),
            records: Vec::new(),
            actors: BTreeSet::new(),
        };
        case.add(root);
        case
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The record that created this case.
    pub fn root(&self) -> &Record {
        &self.records[0]
    }

    /// Member records in assignment order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn actors(&self) -> &BTreeSet<String> {
        &self.actors
    }

    /// Append a record and fold its sender and recipient into the actors.
    pub fn add(&mut self, record: Record) {
        self.actors.insert(record.sender().to_string());
        self.actors.insert(record.recipient().to_string());
        self.records.push(record);
    }

    pub fn contains(&self, record_id: &str) -> bool {
        self.records.iter().any(|r| r.id() == record_id)
    }

    pub fn involves(&self, actor: &str) -> bool {
        self.actors.contains(actor)
    }

    pub(crate) fn record_mut(&mut self, record_id: &str) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id() == record_id)
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.records.iter_mut()
    }

    /// Earliest and latest timestamp plus the seconds between them.
    ///
    /// Computed on every call from the current members.
    pub fn duration(&self) -> CaseDuration {
        let first = self.records[0].timestamp();
        let (start, end) = self
            .records
            .iter()
            .skip(1)
            .fold((first, first), |(lo, hi), r| {
                let t = r.timestamp();
                (lo.min(t), hi.max(t))
            });
        CaseDuration {
            start,
            end,
            elapsed_seconds: (end - start).num_seconds(),
        }
    }

    pub fn message_count(&self) -> usize {
        self.records.len()
    }

    pub fn head_count(&self) -> usize {
        self.actors.len()
    }

    /// Evaluate the case against the reserved `declined` label.
    pub fn outcome(&self, declined: DetectedLabel) -> CaseOutcome {
        match self.records.iter().find(|r| r.detected_label() == declined) {
            Some(r) => CaseOutcome::Declined {
                record_id: r.id().to_string(),
            },
            None => CaseOutcome::Successful,
        }
    }

    pub fn is_successful(&self, declined: DetectedLabel) -> bool {
        self.outcome(declined).is_successful()
    }
}
