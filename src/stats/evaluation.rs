//! Practitioner evaluation: how each handled case compares to the median
//! successful case.
//!
//! For every successful case that involves one of the practitioners, the
//! deltas against the collection medians are combined into a weighted score
//! and then min-max normalized across all practitioners.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{median_duration, median_headcount, median_message_count};
use crate::cluster::CaseCollection;
use crate::error::Result;

/// Weights of the three deltas in the raw score.
///
/// The defaults are the empirically chosen constants from the recruiting study.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Per hour of duration below the median.
    pub duration: f64,
    /// Per message below the median.
    pub messages: f64,
    /// Per person below the median.
    pub headcount: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            duration: 0.025,
            messages: 0.65,
            headcount: 0.2,
        }
    }
}

/// One evaluated case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRow {
    pub practitioner: String,
    pub case_id: String,
    /// Date of the case's latest message.
    pub end_date: NaiveDate,
    /// Median duration minus case duration, in hours.
    pub duration_delta_hours: f64,
    pub message_delta: f64,
    pub headcount_delta: f64,
    /// Weighted score before normalization.
    pub raw_score: f64,
    /// Score normalized to `[0, 1]` over all rows.
    pub score: f64,
}

/// Evaluate the successful cases handled by `practitioners`.
///
/// A case involving several practitioners is credited to the first one
/// listed. Rows are ordered by practitioner, then by end date. When all raw
/// scores are equal every normalized score is 0.
pub fn evaluate_practitioners(
    cases: &CaseCollection,
    practitioners: &[&str],
    weights: ScoreWeights,
) -> Result<Vec<EvaluationRow>> {
    let successful = cases.successful();
    let med_duration = median_duration(&successful)?;
    let med_messages = median_message_count(&successful)?;
    let med_headcount = median_headcount(&successful)?;

    let mut rows: Vec<(usize, EvaluationRow)> = Vec::new();
    for case in &successful {
        let Some(owner) = practitioners.iter().position(|p| case.involves(p)) else {
            continue;
        };
        let duration = case.duration();
        let duration_delta_hours = (med_duration - duration.elapsed_seconds as f64) / 3_600.0;
        let message_delta = med_messages - case.message_count() as f64;
        let headcount_delta = med_headcount - case.head_count() as f64;
        let raw_score = weights.duration * duration_delta_hours
            + weights.messages * message_delta
            + weights.headcount * headcount_delta;

        rows.push((
            owner,
            EvaluationRow {
                practitioner: practitioners[owner].to_string(),
                case_id: case.id().to_string(),
                end_date: duration.end.date(),
                duration_delta_hours,
                message_delta,
                headcount_delta,
                raw_score,
                score: 0.0,
            },
        ));
    }

    rows.sort_by(|(a, ra), (b, rb)| a.cmp(b).then(ra.end_date.cmp(&rb.end_date)));

    let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, r)| {
        (lo.min(r.raw_score), hi.max(r.raw_score))
    });
    let span = max - min;

    Ok(rows
        .into_iter()
        .map(|(_, mut row)| {
            row.score = if span > 0.0 {
                (row.raw_score - min) / span
            } else {
                0.0
            };
            row
        })
        .collect())
}
