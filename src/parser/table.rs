//! Delimited text tables (RFC 4180 quoting, any single-char separator).

use crate::error::{CaseError, Result};

/// A parsed table: one header row and any number of data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    /// `(line number of the row start, cells)`
    rows: Vec<(usize, Vec<String>)>,
}

impl Table {
    /// Parse `text`, treating the first row as headers.
    ///
    /// A leading UTF-8 BOM is skipped. Empty lines are ignored. Rows shorter
    /// than the header are padded with empty cells. CRLF line breaks inside
    /// quoted cells are stored as `\n`.
    pub fn parse(text: &str, separator: char) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = split_records(text, separator)?.into_iter();
        let (_, headers) = records.next().ok_or(CaseError::ParseError {
            line: 1,
            reason: "missing header row".to_string(),
        })?;
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for (line, mut cells) in records {
            if cells.len() > headers.len() {
                return Err(CaseError::ParseError {
                    line,
                    reason: format!(
                        "row has {} fields but the header has {}",
                        cells.len(),
                        headers.len()
                    ),
                });
            }
            cells.resize(headers.len(), String::new());
            rows.push((line, cells));
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column named `name` (case-insensitive).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Rows with the line number they start on.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows.iter().map(|(line, cells)| (*line, cells.as_slice()))
    }
}

/// Split text into records of cells. Quoted cells may span lines.
fn split_records(text: &str, separator: char) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' => {
                    line += 1;
                    cell.push(ch);
                }
                _ => cell.push(ch),
            }
            continue;
        }

        match ch {
            '"' if cell.is_empty() => in_quotes = true,
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                cells.push(std::mem::take(&mut cell));
                push_record(&mut records, record_line, std::mem::take(&mut cells));
                line += 1;
                record_line = line;
            }
            c if c == separator => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(ch),
        }
    }

    if in_quotes {
        return Err(CaseError::ParseError {
            line: record_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !cell.is_empty() || !cells.is_empty() {
        cells.push(cell);
        push_record(&mut records, record_line, cells);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, cells: Vec<String>) {
    let blank = cells.len() == 1 && cells[0].trim().is_empty();
    if !blank {
        records.push((line, cells));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_table() {
        let t = Table::parse("A;B\n1;2\n3;4\n", ';').unwrap();
        assert_eq!(t.headers(), &["A".to_string(), "B".to_string()]);
        assert_eq!(t.len(), 2);
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows[1], (3, &["3".to_string(), "4".to_string()][..]));
    }

    #[test]
    fn test_quoted_cells() {
        let t = Table::parse("A;B\n\"x;y\";\"say \"\"hi\"\"\"\n", ';').unwrap();
        let (_, cells) = t.rows().next().unwrap();
        assert_eq!(cells, &["x;y".to_string(), "say \"hi\"".to_string()]);
    }

    #[test]
    fn test_multiline_cell_keeps_line_numbers() {
        let t = Table::parse("A;B\n1;\"two\nlines\"\n3;4", ';').unwrap();
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows[0].1[1], "two\nlines");
        assert_eq!(rows[1].0, 4);
    }

    #[test]
    fn test_crlf_bom_and_blank_lines() {
        let t = Table::parse("\u{feff}A,B\r\n1,2\r\n\r\n3,4\r\n", ',').unwrap();
        assert_eq!(t.column("a"), Some(0));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_crlf_inside_quoted_cell_becomes_lf() {
        let t = Table::parse("A;B\r\n1;\"two\r\nlines\"\r\n3;4\r\n", ';').unwrap();
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows[0].1[1], "two\nlines");
        assert_eq!(rows[1].0, 4);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let t = Table::parse("A;B;C\n1;2\n", ';').unwrap();
        let (_, cells) = t.rows().next().unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[2], "");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Table::parse("", ';'),
            Err(CaseError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            Table::parse("A;B\n1;2;3\n", ';'),
            Err(CaseError::ParseError { line: 2, .. })
        ));
        assert!(matches!(
            Table::parse("A;B\n\"open;2\n", ';'),
            Err(CaseError::ParseError { line: 2, .. })
        ));
    }
}
