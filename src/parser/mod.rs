//! Column-aligned text fixtures → record tables.
//!
//! ## Format
//!
//! ```text
//! # comments and blank lines are ignored
//! c1   c2.x.xx  c2.y
//! foo  1        a
//! bar           b
//! baz  3        b
//!      4
//!      5        d
//! ```
//!
//! The first significant line is the header. Every value must begin exactly
//! at its column name's offset and must not run into the next column. Tabs
//! are rejected anywhere in the text.
//!
//! ## Pipeline
//!
//! ```text
//! text → parse_header → narrow schema → parse_row (per line)
//!                                          ↓
//!                              boundary test + assemble → Table
//! ```

mod assemble;
mod header;
mod row;

pub use assemble::is_new_record_boundary;
pub use header::{parse_header, Column, Header};
pub use row::{parse_row, RowValues};

use std::collections::HashSet;

use tracing::debug;

use crate::error::{FixtureError, Result};
use crate::schema::Schema;
use crate::table::Table;
use crate::value::Record;
use assemble::{assemble, GroupState, GroupStep};

/// Lines starting with this marker (after indentation) are ignored.
pub const COMMENT_MARKER: char = '#';

fn is_significant(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with(COMMENT_MARKER)
}

/// Parse fixture text against a schema.
///
/// The schema is narrowed to the header's columns first; the returned table
/// carries the narrowed schema. A new top-level record starts on the first
/// data row and on every row that passes the root boundary test.
///
/// A line whose first non-blank character is [`COMMENT_MARKER`] is a comment,
/// even on a continuation row. A value starting with `#` in the first
/// non-blank cell of such a row is dropped and does not round-trip.
///
/// # Errors
/// - `InvalidFormat`: tabs, no header, duplicate header columns
/// - `UnknownColumn`: a header column that is not a leaf of `schema`
/// - `UnsupportedType`: a header column with an unsupported type
/// - `MisalignedColumn` / `InvalidValue`: bad data rows
pub fn build_table(text: &str, schema: &Schema) -> Result<Table> {
    if let Some(index) = text.lines().position(|line| line.contains('\t')) {
        return Err(FixtureError::invalid_format(
            index + 1,
            "tab characters are not allowed, align columns with spaces",
        ));
    }

    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| is_significant(line));

    let Some((header_line, line)) = lines.next() else {
        return Err(FixtureError::invalid_format(0, "missing header line"));
    };
    let header = header::parse_header_at(line, header_line)?;
    let schema = narrow_to_header(schema, &header, header_line)?;
    debug!(columns = ?header.names(), "parsed fixture header");

    let mut records: Vec<Record> = Vec::new();
    for (line_number, line) in lines {
        let row = row::parse_row_at(line, &header, line_number)?;
        let boundary = is_new_record_boundary(schema.fields(), &row);
        if GroupState::of(records.len()).step(boundary) == GroupStep::StartElement {
            records.push(Record::new());
        }
        if let Some(record) = records.last_mut() {
            assemble(schema.fields(), &row, record)?;
        }
    }

    debug!(records = records.len(), "assembled fixture table");
    Ok(Table::from_parts(records, schema))
}

fn narrow_to_header(schema: &Schema, header: &Header, line: usize) -> Result<Schema> {
    let mut seen = HashSet::new();
    for name in header.names() {
        if !seen.insert(name) {
            return Err(FixtureError::invalid_format(
                line,
                format!("duplicate column '{name}'"),
            ));
        }
        match schema.find(name) {
            Some(field) if field.is_leaf() => {}
            _ => {
                return Err(FixtureError::UnknownColumn {
                    column: name.to_string(),
                })
            }
        }
    }
    let narrowed = schema.narrow(&header.names())?;
    narrowed.ensure_supported()?;
    Ok(narrowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CatalogField;
    use crate::value::Value;

    fn flat_schema() -> Schema {
        Schema::from_catalog(&[
            CatalogField::string("c1"),
            CatalogField::integer("c2"),
            CatalogField::new("c3", "TIMESTAMP"),
        ])
        .unwrap()
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "
            # leading comment
            c1   c2

            foo  1
              # indented comment
            bar  2
        ";
        let table = build_table(text, &flat_schema()).unwrap();
        assert_eq!(
            table.records(),
            &[
                Record::new().with("c1", "foo").with("c2", 1i64),
                Record::new().with("c1", "bar").with("c2", 2i64),
            ]
        );
        assert_eq!(table.column_names(), vec!["c1", "c2"]);
    }

    #[test]
    fn test_tab_rejected_with_line() {
        let err = build_table("c1  c2\nfoo\t1", &flat_schema()).unwrap_err();
        assert!(matches!(err, FixtureError::InvalidFormat { line: 2, .. }));
    }

    #[test]
    fn test_missing_header() {
        let err = build_table("\n  # only a comment\n", &flat_schema()).unwrap_err();
        assert_eq!(err.code(), "INVALID_FORMAT");
    }

    #[test]
    fn test_unknown_header_column() {
        let err = build_table("c1  nope\nfoo  1", &flat_schema()).unwrap_err();
        assert!(matches!(err, FixtureError::UnknownColumn { ref column } if column == "nope"));
    }

    #[test]
    fn test_duplicate_header_column() {
        let err = build_table("c1  c1\nfoo  1", &flat_schema()).unwrap_err();
        assert_eq!(err.code(), "INVALID_FORMAT");
    }

    #[test]
    fn test_unsupported_type_in_header() {
        let err = build_table("c1   c3\nfoo  2020", &flat_schema()).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_unsupported_type_outside_header_is_ignored() {
        assert!(build_table("c1\nfoo", &flat_schema()).is_ok());
    }

    #[test]
    fn test_misaligned_row_reports_line() {
        let err = build_table("c1   c2\nfoo  1\n bar 2", &flat_schema()).unwrap_err();
        assert!(matches!(err, FixtureError::MisalignedColumn { line: 3, .. }));
    }

    #[test]
    fn test_hash_leading_continuation_row_is_a_comment() {
        let schema = Schema::from_catalog(&[
            CatalogField::string("c1"),
            CatalogField::string("tags").repeated(),
        ])
        .unwrap();
        let text = "c1   tags\nfoo  a\n     #b\n     c";
        let table = build_table(text, &schema).unwrap();
        assert_eq!(
            table.records(),
            &[Record::new().with("c1", "foo").with("tags", vec!["a", "c"])]
        );
    }

    #[test]
    fn test_zero_and_null_are_kept() {
        let text = "c1    c2\nnull  0";
        let table = build_table(text, &flat_schema()).unwrap();
        assert_eq!(
            table.records(),
            &[Record::new().with("c1", Value::Null).with("c2", 0i64)]
        );
    }
}
