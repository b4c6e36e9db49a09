//! Aggregate statistics over a fully assigned case collection.
//!
//! Nothing here is incremental: every function walks the collection it is
//! given.

pub mod evaluation;

use std::collections::HashMap;

use serde::Serialize;

use crate::cluster::CaseCollection;
use crate::error::{CaseError, Result};
use crate::model::case::Case;
use crate::model::label::DetectedLabel;

/// A detected code only counts as a label's dominant code when it occurs
/// more often than this among the label's records.
pub const MIN_DOMINANT_OCCURRENCES: usize = 2;

/// Standard median: the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(CaseError::EmptyCollection("median"));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

fn median_of(cases: &CaseCollection, what: &'static str, f: impl Fn(&Case) -> f64) -> Result<f64> {
    if cases.is_empty() {
        return Err(CaseError::EmptyCollection(what));
    }
    let values: Vec<f64> = cases.iter().map(f).collect();
    median(&values)
}

/// Median of the case durations, in seconds.
pub fn median_duration(cases: &CaseCollection) -> Result<f64> {
    median_of(cases, "median case duration", |c| c.duration().elapsed_seconds as f64)
}

pub fn median_message_count(cases: &CaseCollection) -> Result<f64> {
    median_of(cases, "median message count", |c| c.message_count() as f64)
}

pub fn median_headcount(cases: &CaseCollection) -> Result<f64> {
    median_of(cases, "median headcount", |c| c.head_count() as f64)
}

/// Headline numbers for a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseSummary {
    pub case_count: usize,
    pub record_count: usize,
    pub successful_cases: usize,
    pub median_duration_seconds: f64,
    pub median_message_count: f64,
    pub median_headcount: f64,
}

/// Compute the [`CaseSummary`] of a non-empty collection.
pub fn summarize(cases: &CaseCollection) -> Result<CaseSummary> {
    Ok(CaseSummary {
        case_count: cases.len(),
        record_count: cases.record_count(),
        successful_cases: cases
            .iter()
            .filter(|c| c.is_successful(cases.declined()))
            .count(),
        median_duration_seconds: median_duration(cases)?,
        median_message_count: median_message_count(cases)?,
        median_headcount: median_headcount(cases)?,
    })
}

/// How well detected labels line up with one train label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelQuota {
    pub train_label: String,
    /// Most frequent detected code among this label's records, if any code
    /// occurs more than [`MIN_DOMINANT_OCCURRENCES`] times.
    pub dominant: Option<u32>,
    pub matches: usize,
    pub mismatches: usize,
    pub quota: f64,
}

impl LabelQuota {
    pub fn record_count(&self) -> usize {
        self.matches + self.mismatches
    }
}

/// Matching quota for `train_label`.
///
/// Frequency ties between candidate codes go to the larger code. With no
/// candidate the quota is 0 and every record counts as a mismatch.
pub fn label_quota(cases: &CaseCollection, train_label: &str) -> LabelQuota {
    let detected: Vec<DetectedLabel> = cases
        .records_by_train_label(train_label)
        .map(|r| r.detected_label())
        .collect();

    let mut counts: HashMap<u32, usize> = HashMap::new();
    for code in detected.iter().filter_map(|d| d.code()) {
        *counts.entry(code).or_default() += 1;
    }

    let dominant = counts
        .into_iter()
        .filter(|&(_, n)| n > MIN_DOMINANT_OCCURRENCES)
        .max_by_key(|&(code, n)| (n, code))
        .map(|(code, _)| code);

    let matches = dominant.map_or(0, |code| {
        detected
            .iter()
            .filter(|d| **d == DetectedLabel::Code(code))
            .count()
    });
    let mismatches = detected.len() - matches;
    let quota = if matches == 0 {
        0.0
    } else {
        matches as f64 / detected.len() as f64
    };

    LabelQuota {
        train_label: train_label.to_string(),
        dominant,
        matches,
        mismatches,
        quota,
    }
}

/// Quotas for every train label, in first-appearance order.
pub fn label_quotas(cases: &CaseCollection) -> Vec<LabelQuota> {
    cases
        .train_labels()
        .into_iter()
        .map(|label| label_quota(cases, label))
        .collect()
}

/// Record-count weighted mean of the quotas.
pub fn weighted_score(quotas: &[LabelQuota]) -> Result<f64> {
    let total: usize = quotas.iter().map(LabelQuota::record_count).sum();
    if total == 0 {
        return Err(CaseError::EmptyCollection("weighted label score"));
    }
    let weighted: f64 = quotas
        .iter()
        .map(|q| q.quota * q.record_count() as f64)
        .sum();
    Ok(weighted / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::CaseEngine;
    use crate::model::record::{InputRow, Record, DEFAULT_DATE_FORMAT};

    fn rec(id: &str, from: &str, to: &str, date: &str, label: Option<&str>) -> Record {
        Record::from_row(
            InputRow {
                from: from.into(),
                to: to.into(),
                subject: String::new(),
                content: String::new(),
                datetime: Some(date.into()),
                message_id: id.into(),
                in_reply_to: None,
                label: label.map(String::from),
            },
            DEFAULT_DATE_FORMAT,
        )
        .unwrap()
    }

    /// Build cases with the given message counts, each case on its own
    /// actor pair and all on the same day.
    fn cases_with_counts(counts: &[usize]) -> CaseCollection {
        let mut engine = CaseEngine::new(14);
        for (c, &n) in counts.iter().enumerate() {
            for m in 0..n {
                engine.assign(rec(
                    &format!("{c}-{m}"),
                    &format!("cand{c}@mail.org"),
                    &format!("hr{c}@acme.com"),
                    &format!("2021-01-01 {:02}:00:00", m),
                    None,
                ));
            }
        }
        engine.into_cases()
    }

    #[test]
    fn test_median_parity() {
        assert_eq!(median(&[1.0, 2.0, 2.0, 3.0, 5.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert_eq!(median(&[7.0]).unwrap(), 7.0);
    }

    #[test]
    fn test_median_empty_is_error() {
        assert!(matches!(median(&[]), Err(CaseError::EmptyCollection(_))));
        let empty = CaseCollection::new();
        assert!(median_duration(&empty).is_err());
        assert!(median_message_count(&empty).is_err());
        assert!(median_headcount(&empty).is_err());
        assert!(summarize(&empty).is_err());
    }

    #[test]
    fn test_median_message_count() {
        let odd = cases_with_counts(&[1, 2, 2, 3, 5]);
        assert_eq!(odd.len(), 5);
        assert_eq!(median_message_count(&odd).unwrap(), 2.0);

        let even = cases_with_counts(&[1, 2, 3, 4]);
        assert_eq!(median_message_count(&even).unwrap(), 2.5);
    }

    #[test]
    fn test_median_duration_and_headcount() {
        let cases = cases_with_counts(&[1, 2, 3]);
        // Durations are 0h, 1h and 2h
        assert_eq!(median_duration(&cases).unwrap(), 3_600.0);
        assert_eq!(median_headcount(&cases).unwrap(), 2.0);
    }

    #[test]
    fn test_summary() {
        let mut cases = cases_with_counts(&[1, 3]);
        cases.set_detected_label("0-0", DetectedLabel::Code(2)).unwrap();
        let summary = summarize(&cases).unwrap();
        assert_eq!(summary.case_count, 2);
        assert_eq!(summary.record_count, 4);
        assert_eq!(summary.successful_cases, 1);
        assert_eq!(summary.median_message_count, 2.0);
    }

    fn labeled(detected: &[(&str, Option<u32>)]) -> CaseCollection {
        let mut engine = CaseEngine::new(14);
        for (i, (train, code)) in detected.iter().enumerate() {
            let id = format!("r{i}");
            engine.assign(rec(&id, "a@x.org", "b@y.org", "2021-01-01 09:00:00", Some(train)));
            if let Some(code) = code {
                engine.set_detected_label(&id, DetectedLabel::Code(*code)).unwrap();
            }
        }
        engine.into_cases()
    }

    #[test]
    fn test_label_quota_dominant_code() {
        let cases = labeled(&[
            ("1", Some(4)),
            ("1", Some(4)),
            ("1", Some(4)),
            ("1", Some(2)),
            ("1", None),
        ]);
        let q = label_quota(&cases, "1");
        assert_eq!(q.dominant, Some(4));
        assert_eq!(q.matches, 3);
        assert_eq!(q.mismatches, 2);
        assert!((q.quota - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_label_quota_needs_more_than_two_occurrences() {
        let cases = labeled(&[("1", Some(4)), ("1", Some(4)), ("1", Some(2))]);
        let q = label_quota(&cases, "1");
        assert_eq!(q.dominant, None);
        assert_eq!(q.matches, 0);
        assert_eq!(q.mismatches, 3);
        assert_eq!(q.quota, 0.0);
    }

    #[test]
    fn test_label_quota_tie_goes_to_larger_code() {
        let cases = labeled(&[
            ("1", Some(3)),
            ("1", Some(3)),
            ("1", Some(3)),
            ("1", Some(7)),
            ("1", Some(7)),
            ("1", Some(7)),
        ]);
        assert_eq!(label_quota(&cases, "1").dominant, Some(7));
    }

    #[test]
    fn test_weighted_score() {
        let cases = labeled(&[
            ("1", Some(4)),
            ("1", Some(4)),
            ("1", Some(4)),
            ("1", Some(0)),
            ("5", Some(5)),
            ("5", Some(1)),
        ]);
        let quotas = label_quotas(&cases);
        assert_eq!(quotas.len(), 2);
        assert_eq!(quotas[0].train_label, "1");
        assert!((quotas[0].quota - 0.75).abs() < 1e-12);
        assert_eq!(quotas[1].quota, 0.0);
        // (0.75 * 4 + 0.0 * 2) / 6
        assert!((weighted_score(&quotas).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_score_empty() {
        assert!(matches!(
            weighted_score(&[]),
            Err(CaseError::EmptyCollection(_))
        ));
    }
}
