//! Header line tokenization.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FixtureError, Result};

/// Runs of non-whitespace characters: one per column name.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

/// A named column starting at a fixed character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// 0-based offset in characters, not bytes.
    pub offset: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

/// Parsed header: column names and where their values must start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    columns: Vec<Column>,
}

impl Header {
    /// Columns must be given in increasing offset order.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn offsets(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.offset).collect()
    }

    /// Rebuild the header line from names and offsets, for diagnostics.
    pub fn render(&self) -> String {
        let mut line = String::new();
        let mut width = 0;
        for column in &self.columns {
            if column.offset > width {
                line.push_str(&" ".repeat(column.offset - width));
                width = column.offset;
            }
            line.push_str(&column.name);
            width += column.name.chars().count();
        }
        line
    }
}

/// Tokenize a header line into columns and their starting offsets.
///
/// # Errors
/// `InvalidFormat` when the line holds no column names.
pub fn parse_header(line: &str) -> Result<Header> {
    parse_header_at(line, 0)
}

pub(crate) fn parse_header_at(line: &str, line_number: usize) -> Result<Header> {
    let columns: Vec<Column> = TOKEN_RE
        .find_iter(line)
        .map(|m| Column::new(m.as_str(), line[..m.start()].chars().count()))
        .collect();
    if columns.is_empty() {
        return Err(FixtureError::invalid_format(
            line_number,
            "header line has no column names",
        ));
    }
    Ok(Header::new(columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_header() {
        let header = parse_header(" c1    col2  Column-4 5").unwrap();
        assert_eq!(header.names(), vec!["c1", "col2", "Column-4", "5"]);
        assert_eq!(header.offsets(), vec![1, 7, 13, 22]);
    }

    #[test]
    fn test_offsets_count_characters() {
        let header = parse_header("naïve  b").unwrap();
        assert_eq!(header.offsets(), vec![0, 7]);
    }

    #[test]
    fn test_empty_header_rejected() {
        let err = parse_header("     ").unwrap_err();
        assert_eq!(err.code(), "INVALID_FORMAT");
    }

    #[test]
    fn test_render_rebuilds_line() {
        let header = Header::new(vec![
            Column::new("c1", 2),
            Column::new("c2.a", 6),
            Column::new("c2.b", 11),
        ]);
        assert_eq!(header.render(), "  c1  c2.a c2.b");
        assert_eq!(parse_header(&header.render()).unwrap(), header);
    }
}
