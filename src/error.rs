//! Centralized error types for mailcases.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailcases library.
#[derive(Error, Debug)]
pub enum CaseError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record was built without the mandatory timestamp.
    #[error("Record '{id}' has no datetime, which is required for case grouping")]
    MissingTimestamp { id: String },

    /// The timestamp is present but does not match the configured format.
    #[error("Record '{id}' has unparsable datetime '{value}' (expected format '{expected}')")]
    InvalidTimestamp {
        id: String,
        value: String,
        expected: String,
    },

    /// A required input field is absent or empty.
    #[error("Required field '{field}' is missing{}", .line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    MissingField {
        field: &'static str,
        line: Option<usize>,
    },

    /// A tabular input file could not be parsed.
    #[error("Parse error on line {line}: {reason}")]
    ParseError { line: usize, reason: String },

    /// A detected label value is not a valid topic code.
    #[error("Invalid detected label '{0}'")]
    InvalidLabel(String),

    /// No case contains a record with this id.
    #[error("No record with id '{0}' has been assigned to a case")]
    UnknownRecord(String),

    /// An aggregate was requested over nothing.
    #[error("Cannot compute {0} over an empty collection")]
    EmptyCollection(&'static str),

    /// An export operation failed.
    #[error("Export error: {0}")]
    ExportError(String),
}

/// Convenience alias for `Result<T, CaseError>`.
pub type Result<T> = std::result::Result<T, CaseError>;

impl CaseError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `CaseError::io`).
impl From<std::io::Error> for CaseError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

impl From<serde_json::Error> for CaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::ExportError(e.to_string())
    }
}
