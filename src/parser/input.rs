//! Reading the tabular message export into [`InputRow`]s and [`Record`]s.

use std::path::Path;

use tracing::info;

use super::table::Table;
use crate::error::{CaseError, Result};
use crate::model::record::{InputRow, Record};

/// Column headers of the message export.
pub mod columns {
    pub const FROM: &str = "From";
    pub const TO: &str = "To";
    pub const SUBJECT: &str = "Subject";
    pub const CONTENT: &str = "Content";
    pub const DATETIME: &str = "Datetime";
    pub const MESSAGE_ID: &str = "Message-ID";
    pub const IN_REPLY_TO: &str = "In-Reply-To";
    pub const LABEL: &str = "Label";
}

/// Read a delimited message export from disk.
pub fn read_input_rows(path: &Path, separator: char) -> Result<Vec<InputRow>> {
    let text = std::fs::read_to_string(path).map_err(|e| CaseError::io(path, e))?;
    let rows = parse_input_rows(&text, separator)?;
    info!(path = %path.display(), rows = rows.len(), "Loaded message export");
    Ok(rows)
}

/// Parse a delimited message export held in memory.
///
/// `From`, `To` and `Message-ID` columns are required; the rest default to
/// empty. Empty `Datetime`, `In-Reply-To` and `Label` cells become `None`.
pub fn parse_input_rows(text: &str, separator: char) -> Result<Vec<InputRow>> {
    let table = Table::parse(text, separator)?;

    let required = |name: &'static str| {
        table.column(name).ok_or(CaseError::MissingField {
            field: name,
            line: Some(1),
        })
    };
    let from = required(columns::FROM)?;
    let to = required(columns::TO)?;
    let message_id = required(columns::MESSAGE_ID)?;
    let subject = table.column(columns::SUBJECT);
    let content = table.column(columns::CONTENT);
    let datetime = table.column(columns::DATETIME);
    let in_reply_to = table.column(columns::IN_REPLY_TO);
    let label = table.column(columns::LABEL);

    let mut out = Vec::with_capacity(table.len());
    for (line, cells) in table.rows() {
        let cell = |idx: Option<usize>| idx.map(|i| cells[i].clone()).unwrap_or_default();
        let optional = |idx: Option<usize>| idx.map(|i| cells[i].trim()).filter(|v| !v.is_empty()).map(String::from);

        let row = InputRow {
            from: cells[from].trim().to_string(),
            to: cells[to].trim().to_string(),
            subject: cell(subject),
            content: cell(content),
            datetime: optional(datetime),
            message_id: cells[message_id].trim().to_string(),
            in_reply_to: optional(in_reply_to),
            label: optional(label),
        };
        for (value, field) in [
            (&row.from, columns::FROM),
            (&row.to, columns::TO),
            (&row.message_id, columns::MESSAGE_ID),
        ] {
            if value.is_empty() {
                return Err(CaseError::MissingField {
                    field,
                    line: Some(line),
                });
            }
        }
        out.push(row);
    }
    Ok(out)
}

/// Validate rows into records, stopping at the first invalid one.
pub fn into_records<I>(rows: I, date_format: &str) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = InputRow>,
{
    rows.into_iter()
        .map(|row| Record::from_row(row, date_format))
        .collect()
}

/// Read and validate a message export in one step.
pub fn load_records(path: &Path, separator: char, date_format: &str) -> Result<Vec<Record>> {
    into_records(read_input_rows(path, separator)?, date_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::DEFAULT_DATE_FORMAT;

    const EXPORT: &str = "\
From;To;Subject;Content;Datetime;Message-ID;In-Reply-To;Label
cand@mail.org;hr@acme.com;Application;\"Dear HR;\nplease find\";2021-01-01 09:00:00;m1;;1
hr@acme.com;cand@mail.org;RE: Application;Thanks;2021-01-02 10:00:00;m2;m1;
";

    #[test]
    fn test_parse_rows() {
        let rows = parse_input_rows(EXPORT, ';').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].content, "Dear HR;\nplease find");
        assert_eq!(rows[0].in_reply_to, None);
        assert_eq!(rows[0].label.as_deref(), Some("1"));
        assert_eq!(rows[1].in_reply_to.as_deref(), Some("m1"));
        assert_eq!(rows[1].label, None);
    }

    #[test]
    fn test_rows_to_records() {
        let records = into_records(parse_input_rows(EXPORT, ';').unwrap(), DEFAULT_DATE_FORMAT).unwrap();
        assert_eq!(records[1].subject(), "Application");
        assert_eq!(records[0].train_label(), Some("1"));
    }

    #[test]
    fn test_column_order_is_free() {
        let text = "Message-ID;Datetime;To;From\nx1;2021-01-01 09:00:00;b@y.org;a@x.org\n";
        let rows = parse_input_rows(text, ';').unwrap();
        assert_eq!(rows[0].from, "a@x.org");
        assert_eq!(rows[0].subject, "");
    }

    #[test]
    fn test_missing_column() {
        let err = parse_input_rows("From;Message-ID\na@x.org;1\n", ';').unwrap_err();
        assert!(matches!(err, CaseError::MissingField { field: "To", line: Some(1) }));
    }

    #[test]
    fn test_empty_required_cell_reports_line() {
        let text = "From;To;Message-ID\na@x.org;b@y.org;1\na@x.org;b@y.org;\n";
        let err = parse_input_rows(text, ';').unwrap_err();
        assert!(matches!(
            err,
            CaseError::MissingField {
                field: "Message-ID",
                line: Some(3)
            }
        ));
    }

    #[test]
    fn test_missing_datetime_fails_record_construction() {
        let text = "From;To;Message-ID;Datetime\na@x.org;b@y.org;1;\n";
        let err = into_records(parse_input_rows(text, ';').unwrap(), DEFAULT_DATE_FORMAT).unwrap_err();
        assert!(matches!(err, CaseError::MissingTimestamp { .. }));
    }
}
