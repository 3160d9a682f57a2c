//! Error types for coercion, path queries and extraction.
//!
//! None of the messages carry the offending value itself: event payloads can
//! hold personal data, so errors name the field, the JSON kind that was found
//! and the kind that was wanted.

use std::fmt;

use crate::coerce::TargetKind;
use crate::runtime::row::RowError;
use crate::schema::ColumnType;
use crate::token::TokenKind;

/// Errors raised while reading or converting JSON.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JsonError {
    #[error("malformed JSON ({category}) at line {line}, column {column} of {length}-byte input")]
    Parse {
        category: &'static str,
        line: usize,
        column: usize,
        length: usize,
    },

    #[error("failed to convert '{path}' from '{found}' to '{target}'")]
    Coercion {
        path: String,
        found: TokenKind,
        target: TargetKind,
    },

    #[error("nesting at '{path}' exceeds the maximum depth of {limit}")]
    DepthExceeded { path: String, limit: usize },

    #[error("invalid path expression '{expression}': {reason}")]
    InvalidPath { expression: String, reason: String },
}

impl JsonError {
    /// Build a parse error from a `serde_json` failure without echoing input.
    pub fn parse(err: &serde_json::Error, input: &str) -> Self {
        let category = match err.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "data",
            serde_json::error::Category::Eof => "unexpected end of input",
        };
        JsonError::Parse {
            category,
            line: err.line(),
            column: err.column(),
            length: input.len(),
        }
    }
}

/// One column of a declared output schema that disagrees with the field contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaMismatch {
    InvalidColumnType {
        column: String,
        actual: ColumnType,
        expected: ColumnType,
    },
    InvalidColumnName {
        column: String,
    },
    DuplicateColumn {
        column: String,
    },
}

impl SchemaMismatch {
    pub fn column(&self) -> &str {
        match self {
            SchemaMismatch::InvalidColumnType { column, .. }
            | SchemaMismatch::InvalidColumnName { column }
            | SchemaMismatch::DuplicateColumn { column } => column,
        }
    }
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaMismatch::InvalidColumnType {
                column,
                actual,
                expected,
            } => write!(
                f,
                "Invalid columnType {} for columnName {}; expected columnType: {}",
                actual, column, expected
            ),
            SchemaMismatch::InvalidColumnName { column } => {
                write!(f, "Invalid columnName {}", column)
            }
            SchemaMismatch::DuplicateColumn { column } => {
                write!(f, "Duplicate columnName {}", column)
            }
        }
    }
}

/// Failure to produce a row for one input line (or for the whole stream).
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{}", join_lines(.0))]
    SchemaMismatch(Vec<SchemaMismatch>),

    #[error("{}", .0.join("\n"))]
    Transformation(Vec<String>),

    #[error(transparent)]
    Json(#[from] JsonError),

    #[error("Unexpected value encountered for field {field} (found {found})")]
    Shape { field: String, found: TokenKind },

    #[error(transparent)]
    Row(#[from] RowError),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Individual messages, one per schema mismatch or transformer complaint.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ExtractionError::SchemaMismatch(mismatches) => {
                mismatches.iter().map(ToString::to_string).collect()
            }
            ExtractionError::Transformation(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }

    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, ExtractionError::SchemaMismatch(_))
    }
}

fn join_lines(mismatches: &[SchemaMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
