//! Validated message records and the input row they are built from.

use chrono::NaiveDateTime;

use super::label::DetectedLabel;
use crate::error::{CaseError, Result};

/// Default `strftime` format of the `Datetime` column.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reply and forward prefixes stripped from subjects.
const SUBJECT_PREFIXES: [&str; 3] = ["re:", "fwd:", "aw:"];

/// One row of the tabular message export, before validation.
///
/// Columns are mapped onto the fields by [`crate::parser::input`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRow {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub content: String,
    pub datetime: Option<String>,
    pub message_id: String,
    pub in_reply_to: Option<String>,
    pub label: Option<String>,
}

/// A single validated message.
///
/// Everything except the detected label is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    sender: String,
    recipient: String,
    subject: String,
    body: String,
    in_reply_to: Option<String>,
    timestamp: NaiveDateTime,
    train_label: Option<String>,
    detected_label: DetectedLabel,
}

impl Record {
    /// Validate an input row, parsing `Datetime` with `date_format`.
    ///
    /// Fails with [`CaseError::MissingTimestamp`] when the column is empty
    /// and [`CaseError::InvalidTimestamp`] when it does not parse.
    pub fn from_row(row: InputRow, date_format: &str) -> Result<Self> {
        let timestamp = match row.datetime.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDateTime::parse_from_str(raw, date_format).map_err(|_| {
                CaseError::InvalidTimestamp {
                    id: row.message_id.clone(),
                    value: raw.to_string(),
                    expected: date_format.to_string(),
                }
            })?),
        };
        Self::with_timestamp(row, timestamp)
    }

    /// Validate an input row whose timestamp was parsed elsewhere.
    ///
    /// The row's own `datetime` string is ignored.
    pub fn with_timestamp(row: InputRow, timestamp: Option<NaiveDateTime>) -> Result<Self> {
        let id = required(row.message_id, "Message-ID")?;
        let Some(timestamp) = timestamp else {
            return Err(CaseError::MissingTimestamp { id });
        };
        Ok(Self {
            sender: required(row.from, "From")?,
            recipient: required(row.to, "To")?,
            subject: normalize_subject(&row.subject),
            body: row.content,
            in_reply_to: non_empty(row.in_reply_to),
            timestamp,
            train_label: non_empty(row.label),
            detected_label: DetectedLabel::Unset,
            id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Subject with reply/forward prefixes removed.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn in_reply_to(&self) -> Option<&str> {
        self.in_reply_to.as_deref()
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn train_label(&self) -> Option<&str> {
        self.train_label.as_deref()
    }

    pub fn detected_label(&self) -> DetectedLabel {
        self.detected_label
    }

    pub fn set_detected_label(&mut self, label: DetectedLabel) {
        self.detected_label = label;
    }

    /// Whether `actor` is this record's sender or recipient.
    pub fn involves(&self, actor: &str) -> bool {
        self.sender == actor || self.recipient == actor
    }

    /// Whether the two records have a sender or recipient in common.
    pub fn shares_actor_with(&self, other: &Record) -> bool {
        other.involves(&self.sender) || other.involves(&self.recipient)
    }

    /// Text handed to the topic model: subject and body joined by a space.
    pub fn document(&self) -> String {
        format!("{} {}", self.subject, self.body)
    }
}

/// Strip leading `Re:`, `Fwd:` and `Aw:` prefixes (any case, repeated).
///
/// Only the prefixes are matched case-insensitively; the remaining text is
/// returned unchanged apart from trimming.
pub fn normalize_subject(subject: &str) -> String {
    let mut s = subject.trim();
    'outer: loop {
        for prefix in SUBJECT_PREFIXES {
            let matches = s
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
            if matches {
                s = s[prefix.len()..].trim_start();
                continue 'outer;
            }
        }
        break;
    }
    s.to_string()
}

fn required(value: String, field: &'static str) -> Result<String> {
    if value.trim().is_empty() {
        Err(CaseError::MissingField { field, line: None })
    } else {
        Ok(value)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
