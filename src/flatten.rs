//! Record tree → flat rows.
//!
//! Each record is written starting at the next free row. A repeated field
//! with N elements writes its elements onto successive rows; sibling fields
//! start on the same row as the record, so a short field leaves blank cells on
//! the extra rows a longer sibling needs. A record always occupies at least one
//! row. Field order follows the schema, which makes the output byte-stable.

use std::collections::HashMap;

use crate::schema::{FieldShape, Schema, SchemaField};
use crate::table::Table;
use crate::value::{Record, Value};

/// One cell: `None` renders blank.
pub type Cell = Option<Value>;

/// Header plus rows of cells, aligned to [`Schema::column_names`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl FlatTable {
    /// Header followed by data rows, every cell rendered to text.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(Value::to_string).unwrap_or_default())
                    .collect()
            }))
            .collect()
    }
}

/// Flatten a table into rows of leaf values.
pub fn flatten(table: &Table) -> FlatTable {
    flatten_records(table.records(), table.schema())
}

/// Flatten records that follow `schema`.
pub fn flatten_records(records: &[Record], schema: &Schema) -> FlatTable {
    let header = schema.column_names();
    let mut writer = RowWriter::new(&header);

    let mut next = 0;
    for record in records {
        next = writer.record(record, schema.fields(), next);
        writer.ensure_rows(next);
    }

    FlatTable {
        header,
        rows: writer.rows,
    }
}

struct RowWriter {
    columns: HashMap<String, usize>,
    width: usize,
    rows: Vec<Vec<Cell>>,
}

impl RowWriter {
    fn new(header: &[String]) -> Self {
        Self {
            columns: header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect(),
            width: header.len(),
            rows: Vec::new(),
        }
    }

    /// Write `record` from row `start`; returns one past the last row used.
    fn record(&mut self, record: &Record, fields: &[SchemaField], start: usize) -> usize {
        let mut end = start + 1;
        for field in fields {
            if let Some(value) = record.get(field.name()) {
                end = end.max(self.value(value, field, start));
            }
        }
        end
    }

    fn value(&mut self, value: &Value, field: &SchemaField, start: usize) -> usize {
        match value {
            Value::Repeated(items) => items
                .iter()
                .fold(start, |row, item| self.element(item, field, row)),
            single => self.element(single, field, start),
        }
    }

    fn element(&mut self, value: &Value, field: &SchemaField, row: usize) -> usize {
        match (field.shape(), value) {
            (FieldShape::Composite(subfields), Value::Record(record)) => {
                self.record(record, subfields, row)
            }
            (FieldShape::Leaf(_), _) => {
                self.set(row, field.qualified_path(), value.clone());
                row + 1
            }
            // Shape mismatches never reach here: Table::new rejects them.
            (FieldShape::Composite(_), _) => row + 1,
        }
    }

    fn set(&mut self, row: usize, column: &str, value: Value) {
        let Some(&index) = self.columns.get(column) else {
            return;
        };
        self.ensure_rows(row + 1);
        self.rows[row][index] = Some(value);
    }

    fn ensure_rows(&mut self, len: usize) {
        if self.rows.len() < len {
            self.rows.resize(len, vec![None; self.width]);
        }
    }
}
