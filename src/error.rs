//! Error types for fixture parsing, decoding and schema handling.
//!
//! Every failure is structural and deterministic: errors are raised where
//! they are detected and abort the whole conversion.

use thiserror::Error;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FixtureError>;

/// Errors raised while converting between fixtures, record trees and wire rows.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture text is structurally malformed (tabs, missing header, ...).
    #[error("invalid fixture format at line {line}: {message}")]
    InvalidFormat {
        /// 1-based line in the fixture text (0 when not tied to a line).
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// A data value does not start or end where the header declares.
    #[error("values do not line up with columns at line {line}:\n{header}\n{row}")]
    MisalignedColumn {
        /// 1-based line of the offending row.
        line: usize,
        /// Header line reconstructed from the parsed columns.
        header: String,
        /// The offending row, verbatim.
        row: String,
    },

    /// A schema field's type is outside the supported set.
    #[error("field type not supported: {type_name} ({path})")]
    UnsupportedType {
        /// Qualified path of the field.
        path: String,
        /// Declared type name.
        type_name: String,
    },

    /// A header or narrowing request names a path the schema does not have.
    #[error("unknown column: {column}")]
    UnknownColumn {
        /// The requested path.
        column: String,
    },

    /// A cell could not be coerced to its column's primitive type.
    #[error("invalid {expected} value '{value}' in column {column}")]
    InvalidValue {
        /// Qualified path of the column.
        column: String,
        /// Raw text that failed to coerce.
        value: String,
        /// Expected primitive type.
        expected: &'static str,
    },

    /// A catalog schema violates a structural invariant.
    #[error("invalid schema at {path}: {reason}")]
    InvalidSchema {
        /// Qualified path of the offending field.
        path: String,
        /// What was wrong.
        reason: String,
    },

    /// A wire row does not have the shape its schema describes.
    #[error("malformed wire value at {path}: {reason}")]
    MalformedWire {
        /// Qualified path being decoded.
        path: String,
        /// What was wrong.
        reason: String,
    },

    /// A record handed to [`crate::Table::new`] does not conform to the schema.
    #[error("record does not match schema at {path}: {reason}")]
    InvalidRecord {
        /// Qualified path of the offending value.
        path: String,
        /// What was wrong.
        reason: String,
    },

    /// Text that is not a `[project:]dataset.table` reference.
    #[error("bad table reference: {reference}")]
    InvalidTableRef {
        /// The rejected text.
        reference: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FixtureError {
    /// Stable error code for this error type.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "INVALID_FORMAT",
            Self::MisalignedColumn { .. } => "MISALIGNED_COLUMN",
            Self::UnsupportedType { .. } => "UNSUPPORTED_TYPE",
            Self::UnknownColumn { .. } => "UNKNOWN_COLUMN",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::InvalidSchema { .. } => "INVALID_SCHEMA",
            Self::MalformedWire { .. } => "MALFORMED_WIRE",
            Self::InvalidRecord { .. } => "INVALID_RECORD",
            Self::InvalidTableRef { .. } => "INVALID_TABLE_REF",
            Self::Io(_) => "IO",
            Self::Json(_) => "JSON",
            Self::Yaml(_) => "YAML",
        }
    }

    pub(crate) fn invalid_format(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misaligned_message_shows_header_and_row() {
        let err = FixtureError::MisalignedColumn {
            line: 3,
            header: "  c1  c2.a c2.b".to_string(),
            row: "  ab cde   fghi".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("line 3"));
        assert!(message.ends_with("  c1  c2.a c2.b\n  ab cde   fghi"));
        assert_eq!(err.code(), "MISALIGNED_COLUMN");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FixtureError = io.into();
        assert_eq!(err.code(), "IO");
    }
}
