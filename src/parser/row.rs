//! Data row slicing with alignment checks.

use std::collections::BTreeMap;

use super::header::Header;
use crate::error::{FixtureError, Result};

/// Raw cell text of one data row, keyed by column name. Blank cells are absent.
pub type RowValues = BTreeMap<String, String>;

/// Slice a data row into its columns.
///
/// Each column owns the characters from its offset up to the next column's
/// offset (or the end of the line). A row that ends early leaves the remaining
/// columns absent.
///
/// # Errors
/// `MisalignedColumn` when a value runs into the next column, starts after
/// its column's offset, or appears before the first column.
pub fn parse_row(line: &str, header: &Header) -> Result<RowValues> {
    parse_row_at(line, header, 0)
}

pub(crate) fn parse_row_at(line: &str, header: &Header, line_number: usize) -> Result<RowValues> {
    let misaligned = || FixtureError::MisalignedColumn {
        line: line_number,
        header: header.render(),
        row: line.to_string(),
    };

    let chars: Vec<char> = line.chars().collect();
    let columns = header.columns();
    let mut values = RowValues::new();

    let Some(first) = columns.first() else {
        return Ok(values);
    };
    if chars.iter().take(first.offset).any(|c| !c.is_whitespace()) {
        return Err(misaligned());
    }

    for (i, column) in columns.iter().enumerate() {
        let start = column.offset;
        if start >= chars.len() {
            break;
        }

        let next = columns.get(i + 1).map(|c| c.offset);
        let end = next.map_or(chars.len(), |n| n.min(chars.len())).max(start);
        let cell = &chars[start..end];

        if let Some(next) = next {
            let overruns = chars.len() > next && cell.last().is_some_and(|c| !c.is_whitespace());
            if overruns {
                return Err(misaligned());
            }
        }

        let text: String = cell.iter().collect();
        let value = text.trim();
        if value.is_empty() {
            continue;
        }
        if cell.first().is_some_and(|c| c.is_whitespace()) {
            return Err(misaligned());
        }
        values.insert(column.name.clone(), value.to_string());
    }

    Ok(values)
}
