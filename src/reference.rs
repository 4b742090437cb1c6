//! Table references, mock table naming and query rewriting.
//!
//! Mocked tables live in one project/dataset under content-derived names;
//! a query written against the real tables is rewritten to read the mocks
//! instead. Everything here is pure string work. Creating the mock tables
//! is up to the caller.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::info;

use crate::error::{FixtureError, Result};
use crate::fingerprint::{fingerprint_with_len, FINGERPRINT_LEN};
use crate::table::Table;

/// `[project:]dataset.table` or `project.dataset.table`, optionally quoted
/// with backticks or square brackets.
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\[`]?(?:(?P<project>[-a-zA-Z0-9_]+)[:.])?(?P<dataset>[a-zA-Z0-9_]+)\.(?P<table>[a-zA-Z0-9_]+)[\]`]?",
    )
    .unwrap()
});

/// Reference to a table, with or without its project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project: Option<String>,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(project: Option<&str>, dataset: &str, table: &str) -> Self {
        Self {
            project: project.map(str::to_string),
            dataset: dataset.to_string(),
            table: table.to_string(),
        }
    }

    /// Parse a whole reference such as `` `p.d.t` ``, `[p:d.t]` or `d.t`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        TABLE_RE
            .captures(text)
            .filter(|caps| caps.get(0).is_some_and(|m| m.start() == 0 && m.end() == text.len()))
            .map(|caps| Self::from_captures(&caps))
            .ok_or_else(|| FixtureError::InvalidTableRef {
                reference: text.to_string(),
            })
    }

    fn from_captures(caps: &Captures<'_>) -> Self {
        let group = |name| caps.name(name).map_or("", |m| m.as_str());
        Self::new(
            caps.name("project").map(|m| m.as_str()),
            group("dataset"),
            group("table"),
        )
    }

    /// This reference with `project` filled in when it has none.
    pub fn with_default_project(&self, project: &str) -> Self {
        Self {
            project: Some(self.project.clone().unwrap_or_else(|| project.to_string())),
            ..self.clone()
        }
    }
}

impl FromStr for TableRef {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{project}.{}.{}", self.dataset, self.table),
            None => write!(f, "{}.{}", self.dataset, self.table),
        }
    }
}

/// `{prefix}_{table}_{fingerprint}`: the same content always maps to the
/// same mock table.
pub fn mock_table_name(prefix: &str, table_ref: &TableRef, table: &Table) -> String {
    mock_table_name_with_len(prefix, table_ref, table, FINGERPRINT_LEN)
}

/// [`mock_table_name`] with a custom fingerprint length.
pub fn mock_table_name_with_len(
    prefix: &str,
    table_ref: &TableRef,
    table: &Table,
    fingerprint_len: usize,
) -> String {
    format!(
        "{prefix}_{}_{}",
        table_ref.table,
        fingerprint_with_len(table, fingerprint_len)
    )
}

/// Where mock tables live and how queries quote them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    /// Default project for references without one; also the mock project.
    pub project: String,
    /// Dataset holding the mock tables.
    pub dataset: String,
    pub legacy_sql: bool,
}

impl QueryContext {
    pub fn new(project: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            legacy_sql: false,
        }
    }

    pub fn with_legacy_sql(mut self, legacy_sql: bool) -> Self {
        self.legacy_sql = legacy_sql;
        self
    }

    /// Fully qualified, quoted id of a mock table.
    pub fn mock_table_id(&self, mock_name: &str) -> String {
        if self.legacy_sql {
            format!("[{}:{}.{}]", self.project, self.dataset, mock_name)
        } else {
            format!("`{}.{}.{}`", self.project, self.dataset, mock_name)
        }
    }
}

/// Replace every reference in `sql` that resolves to a key of `mocks` with
/// the quoted id of its mock table.
///
/// References are resolved against `ctx.project` before matching, so `d.t`
/// and `` `p.d.t` `` hit the same mock when `p` is the default project.
/// Replacement happens in a single pass over match spans.
pub fn rewrite_query(sql: &str, mocks: &HashMap<TableRef, String>, ctx: &QueryContext) -> String {
    let resolved: HashMap<TableRef, &str> = mocks
        .iter()
        .map(|(table_ref, mock)| (table_ref.with_default_project(&ctx.project), mock.as_str()))
        .collect();

    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for caps in TABLE_RE.captures_iter(sql) {
        let Some(span) = caps.get(0) else {
            continue;
        };
        let table_ref = TableRef::from_captures(&caps).with_default_project(&ctx.project);
        match resolved.get(&table_ref) {
            Some(mock) => {
                out.push_str(&sql[last..span.start()]);
                out.push_str(&ctx.mock_table_id(mock));
                last = span.end();
            }
            None => info!(reference = span.as_str(), "not mocking table"),
        }
    }
    out.push_str(&sql[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CatalogField, Schema};
    use crate::value::Record;

    fn mocks(entries: &[(&str, &str)]) -> HashMap<TableRef, String> {
        entries
            .iter()
            .map(|(reference, mock)| (TableRef::parse(reference).unwrap(), mock.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            TableRef::parse("`abc.def.ghi`").unwrap(),
            TableRef::new(Some("abc"), "def", "ghi")
        );
        assert_eq!(
            TableRef::parse("[my-project:suv.wxy]").unwrap(),
            TableRef::new(Some("my-project"), "suv", "wxy")
        );
        assert_eq!(
            TableRef::parse("abc.def").unwrap(),
            TableRef::new(None, "abc", "def")
        );
    }

    #[test]
    fn test_parse_rejects_partial_matches() {
        for bad in ["abc", "abc.def ghi", "select abc.def", ""] {
            let err = TableRef::parse(bad).unwrap_err();
            assert_eq!(err.code(), "INVALID_TABLE_REF", "{bad}");
        }
    }

    #[test]
    fn test_display_round_trips() {
        let table_ref: TableRef = "my-project.abc.def".parse().unwrap();
        assert_eq!(table_ref.to_string(), "my-project.abc.def");
        assert_eq!(TableRef::new(None, "a", "b").to_string(), "a.b");
    }

    #[test]
    fn test_rewrite_query_standard_sql() {
        let mocks = mocks(&[
            ("`abc.def.ghi`", "mock1"),
            ("[jkl:mno.pqr]", "mock2"),
            ("`suv.wxy`", "mock3"),
            ("my-project.abc.def", "mock4"),
        ]);
        let sql = "
            select * from
                abc.def.ghi,
                `jkl.mno.pqr`,
                [my-project:suv.wxy],
                abc.def
        ";
        let expected = "
            select * from
                `my-project.my_dataset.mock1`,
                `my-project.my_dataset.mock2`,
                `my-project.my_dataset.mock3`,
                `my-project.my_dataset.mock4`
        ";
        let ctx = QueryContext::new("my-project", "my_dataset");
        assert_eq!(rewrite_query(sql, &mocks, &ctx), expected);
    }

    #[test]
    fn test_rewrite_query_legacy_sql() {
        let mocks = mocks(&[("`abc.def`", "mock1")]);
        let sql = "select * from\n    abc.def\n";
        let ctx = QueryContext::new("my-project", "my_dataset").with_legacy_sql(true);
        assert_eq!(
            rewrite_query(sql, &mocks, &ctx),
            "select * from\n    [my-project:my_dataset.mock1]\n"
        );
    }

    #[test]
    fn test_rewrite_query_leaves_other_references() {
        let mocks = mocks(&[("abc.def", "mock1")]);
        let sql = "select t.a from other.tbl t join abc.def using (a)";
        let ctx = QueryContext::new("p", "d");
        assert_eq!(
            rewrite_query(sql, &mocks, &ctx),
            "select t.a from other.tbl t join `p.d.mock1` using (a)"
        );
    }

    #[test]
    fn test_rewrite_query_does_not_touch_longer_names() {
        let mocks = mocks(&[("p.abc.def", "mock1")]);
        let sql = "select * from p.abc.def, q.abc.def";
        let ctx = QueryContext::new("p", "d");
        assert_eq!(
            rewrite_query(sql, &mocks, &ctx),
            "select * from `p.d.mock1`, q.abc.def"
        );
    }

    #[test]
    fn test_mock_table_name_is_content_addressed() {
        let schema = Schema::from_catalog(&[CatalogField::string("c1")]).unwrap();
        let a = Table::new(vec![Record::new().with("c1", "a")], schema.clone()).unwrap();
        let b = Table::new(vec![Record::new().with("c1", "b")], schema).unwrap();
        let table_ref = TableRef::parse("`proj.ds.events`").unwrap();

        let name = mock_table_name("fixture_mock", &table_ref, &a);
        assert!(name.starts_with("fixture_mock_events_"));
        assert_eq!(name.len(), "fixture_mock_events_".len() + FINGERPRINT_LEN);
        assert_eq!(name, mock_table_name("fixture_mock", &table_ref, &a.clone()));
        assert_ne!(name, mock_table_name("fixture_mock", &table_ref, &b));
        assert_eq!(
            mock_table_name_with_len("m", &table_ref, &a, 6).len(),
            "m_events_".len() + 6
        );
    }
}
