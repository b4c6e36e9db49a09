//! Incremental case assignment.
//!
//! Each record is attached to exactly one case, using the first rule that
//! matches:
//!
//! 1. **Thread reference**: `In-Reply-To` names a record that is already
//!    part of a case.
//! 2. **Actor proximity**: some earlier record shares a sender or recipient
//!    and lies within `max_days`. Cases are scanned in creation order and
//!    records in insertion order; the first hit wins.
//! 3. **New case** rooted at the record.
//!
//! The outcome depends on input order. Cases are never merged, so a late
//! record that links two existing cases only joins one of them.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::collection::CaseCollection;
use crate::error::Result;
use crate::model::case::Case;
use crate::model::label::DetectedLabel;
use crate::model::record::Record;

/// Default proximity window in days.
pub const DEFAULT_MAX_DAYS: i64 = 14;

const SECONDS_PER_DAY: i64 = 86_400;

/// Which rule placed a record in its case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignReason {
    ThreadReference,
    ActorProximity,
    NewCase,
}

/// Result of [`CaseEngine::assign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub case_id: String,
    pub reason: AssignReason,
}

/// Owns the growing case collection and the set of assigned record ids.
///
/// `assign` takes `&mut self`; callers feed records one at a time in input
/// order.
#[derive(Debug, Clone)]
pub struct CaseEngine {
    cases: CaseCollection,
    max_days: i64,
    assigned: HashSet<String>,
}

impl CaseEngine {
    pub fn new(max_days: i64) -> Self {
        Self::with_collection(CaseCollection::new(), max_days)
    }

    /// Engine that appends to `cases` (usually an empty collection carrying
    /// a non-default declined label).
    pub fn with_collection(cases: CaseCollection, max_days: i64) -> Self {
        let assigned = cases.records().map(|r| r.id().to_string()).collect();
        Self {
            cases,
            max_days,
            assigned,
        }
    }

    pub fn max_days(&self) -> i64 {
        self.max_days
    }

    pub fn cases(&self) -> &CaseCollection {
        &self.cases
    }

    pub fn into_cases(self) -> CaseCollection {
        self.cases
    }

    /// Ids of every record assigned so far.
    pub fn assigned(&self) -> &HashSet<String> {
        &self.assigned
    }

    pub fn is_assigned(&self, record_id: &str) -> bool {
        self.assigned.contains(record_id)
    }

    /// Attach `record` to an existing case or start a new one.
    pub fn assign(&mut self, record: Record) -> Assignment {
        if !self.assigned.insert(record.id().to_string()) {
            warn!(id = record.id(), "Record id assigned twice; lookups will find the first");
        }

        let (index, reason) = match self.find_home(&record) {
            Some(found) => found,
            None => {
                let case_id = record.id().to_string();
                debug!(id = record.id(), "Starting new case");
                self.cases.push(Case::new(record));
                return Assignment {
                    case_id,
                    reason: AssignReason::NewCase,
                };
            }
        };

        let case = self.cases.case_mut(index);
        debug!(id = record.id(), case = case.id(), ?reason, "Joined existing case");
        let case_id = case.id().to_string();
        case.add(record);
        Assignment { case_id, reason }
    }

    /// Assign every record in order.
    pub fn assign_all<I>(&mut self, records: I) -> Vec<Assignment>
    where
        I: IntoIterator<Item = Record>,
    {
        records.into_iter().map(|r| self.assign(r)).collect()
    }

    /// Set the detected label of an assigned record.
    pub fn set_detected_label(&mut self, record_id: &str, label: DetectedLabel) -> Result<()> {
        self.cases.set_detected_label(record_id, label)
    }

    fn find_home(&self, record: &Record) -> Option<(usize, AssignReason)> {
        if let Some(parent) = record.in_reply_to() {
            if let Some(index) = self.cases.position_of_record(parent) {
                return Some((index, AssignReason::ThreadReference));
            }
            debug!(id = record.id(), in_reply_to = parent, "Unresolved reply reference");
        }

        self.cases
            .iter()
            .position(|case| {
                case.records().iter().any(|member| {
                    member.shares_actor_with(record)
                        && within_days(member.timestamp(), record.timestamp(), self.max_days)
                })
            })
            .map(|index| (index, AssignReason::ActorProximity))
    }
}

/// Whether `member` and `candidate` lie at most `max_days` whole days apart.
///
/// The signed difference `member - candidate` is floored to whole days
/// before taking the absolute value, so a candidate one hour *after* a
/// member already counts as one day away while one hour *before* counts as
/// zero.
pub fn within_days(member: NaiveDateTime, candidate: NaiveDateTime, max_days: i64) -> bool {
    let seconds = (member - candidate).num_seconds();
    seconds.div_euclid(SECONDS_PER_DAY).abs() <= max_days
}
