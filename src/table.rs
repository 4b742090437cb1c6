//! Tables: records plus the schema that describes them.
//!
//! A [`Table`] is built once, by [`crate::build_table`], [`crate::decode`] or
//! [`Table::new`], and never mutated. Flat rows, rendered text and the
//! fingerprint are recomputed from its contents on demand.

use std::fmt;

use crate::error::{FixtureError, Result};
use crate::flatten::{self, FlatTable};
use crate::fingerprint;
use crate::parser::build_table;
use crate::render::{self, DEFAULT_MIN_SPACING};
use crate::schema::{FieldShape, LeafType, Schema, SchemaField};
use crate::value::{Record, Value};

/// Ordered records described by one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    records: Vec<Record>,
    schema: Schema,
}

impl Table {
    /// Build a table from hand-written records, checking that every record
    /// conforms to `schema`.
    ///
    /// # Errors
    /// `InvalidRecord` for keys the schema does not declare or values of the
    /// wrong shape, `UnsupportedType` for values under unsupported leaves.
    pub fn new(records: Vec<Record>, schema: Schema) -> Result<Self> {
        for record in &records {
            check_record(record, schema.fields(), "")?;
        }
        Ok(Self { records, schema })
    }

    /// Records produced by the parser or decoder, which already conform.
    pub(crate) fn from_parts(records: Vec<Record>, schema: Schema) -> Self {
        Self { records, schema }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Leaf column paths in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema.column_names()
    }

    pub fn flatten(&self) -> FlatTable {
        flatten::flatten(self)
    }

    /// Render as column-aligned fixture text.
    pub fn prettyprint(&self, widths: Option<&[usize]>, min_spacing: usize) -> String {
        render::render(&self.flatten(), widths, min_spacing)
    }

    pub fn fingerprint(&self) -> String {
        fingerprint::fingerprint(self)
    }

    /// One compact JSON object per record, each terminated by a newline.
    pub fn to_ndjson(&self) -> Result<String> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prettyprint(None, DEFAULT_MIN_SPACING))
    }
}

fn qualify(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn check_record(record: &Record, fields: &[SchemaField], parent: &str) -> Result<()> {
    for (name, value) in record.iter() {
        let Some(field) = fields.iter().find(|f| f.name() == name) else {
            return Err(FixtureError::InvalidRecord {
                path: qualify(parent, name),
                reason: "field is not declared by the schema".to_string(),
            });
        };
        if field.repeated() {
            let Value::Repeated(items) = value else {
                return Err(invalid(field, "repeated field must hold a list"));
            };
            for item in items {
                check_element(item, field)?;
            }
        } else {
            check_element(value, field)?;
        }
    }
    Ok(())
}

fn check_element(value: &Value, field: &SchemaField) -> Result<()> {
    match (field.shape(), value) {
        (FieldShape::Leaf(LeafType::Unsupported(type_name)), _) => {
            Err(FixtureError::UnsupportedType {
                path: field.qualified_path().to_string(),
                type_name: type_name.clone(),
            })
        }
        (FieldShape::Leaf(_), Value::Null) => Ok(()),
        (FieldShape::Leaf(LeafType::String), Value::String(_))
        | (FieldShape::Leaf(LeafType::Integer), Value::Integer(_))
        | (FieldShape::Leaf(LeafType::Boolean), Value::Boolean(_))
        | (FieldShape::Leaf(LeafType::Float), Value::Float(_)) => Ok(()),
        (FieldShape::Leaf(leaf), _) => Err(invalid(field, &format!("expected a {}", leaf.name()))),
        (FieldShape::Composite(subfields), Value::Record(record)) => {
            check_record(record, subfields, field.qualified_path())
        }
        (FieldShape::Composite(_), _) => Err(invalid(field, "expected a record")),
    }
}

fn invalid(field: &SchemaField, reason: &str) -> FixtureError {
    FixtureError::InvalidRecord {
        path: field.qualified_path().to_string(),
        reason: reason.to_string(),
    }
}

/// Both sides of a table comparison, rendered on a common grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableComparison {
    pub actual_columns: Vec<String>,
    pub expected_columns: Vec<String>,
    pub actual_text: String,
    pub expected_text: String,
}

impl TableComparison {
    pub fn columns_match(&self) -> bool {
        self.actual_columns == self.expected_columns
    }

    /// Equal column lists and equal rendered text.
    pub fn is_equal(&self) -> bool {
        self.columns_match() && self.actual_text == self.expected_text
    }
}

impl fmt::Display for TableComparison {
    /// Mismatch report: differing columns, then differing lines as
    /// `-expected` / `+actual` pairs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.columns_match() {
            writeln!(
                f,
                "columns differ:\n-{}\n+{}",
                self.expected_columns.join(", "),
                self.actual_columns.join(", ")
            )?;
        }
        let expected: Vec<&str> = self.expected_text.lines().collect();
        let actual: Vec<&str> = self.actual_text.lines().collect();
        for index in 0..expected.len().max(actual.len()) {
            let left = expected.get(index).copied();
            let right = actual.get(index).copied();
            if left == right {
                continue;
            }
            writeln!(f, "line {}:", index + 1)?;
            if let Some(line) = left {
                writeln!(f, "-{line}")?;
            }
            if let Some(line) = right {
                writeln!(f, "+{line}")?;
            }
        }
        Ok(())
    }
}

/// Render both tables against the union of their column widths.
pub fn compare(actual: &Table, expected: &Table) -> TableComparison {
    let actual_flat = actual.flatten();
    let expected_flat = expected.flatten();
    let widths = render::union_widths(
        &render::column_widths(&actual_flat),
        &render::column_widths(&expected_flat),
    );
    TableComparison {
        actual_columns: actual_flat.header.clone(),
        expected_columns: expected_flat.header.clone(),
        actual_text: render::render(&actual_flat, Some(&widths), DEFAULT_MIN_SPACING),
        expected_text: render::render(&expected_flat, Some(&widths), DEFAULT_MIN_SPACING),
    }
}

/// Compare `actual` with fixture text parsed against `actual`'s schema.
pub fn compare_to_fixture(actual: &Table, expected: &str) -> Result<TableComparison> {
    let expected = build_table(expected, actual.schema())?;
    Ok(compare(actual, &expected))
}

/// Test-assertion equality: same columns and same rendered text.
pub fn tables_equal(actual: &Table, expected: &Table) -> bool {
    compare(actual, expected).is_equal()
}
