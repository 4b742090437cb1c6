//! Query-result wire format → record tables.
//!
//! The remote store returns rows as positional field lists:
//!
//! ```text
//! {"f": [{"v": "foo"},                                  // c1
//!        {"v": [{"v": {"f": [{"v": [...]}, {"v": "a"}]}}]}]}  // c2 (repeated record)
//! ```
//!
//! Cells pair with schema fields by position at every level. Leaf values
//! arrive as text and go through the same coercion as fixture cells. JSON
//! null, empty text and empty lists mean "absent"; the text `null` is the
//! explicit [`Value::Null`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FixtureError, Result};
use crate::schema::{CatalogField, FieldShape, LeafType, Schema, SchemaField};
use crate::table::Table;
use crate::value::{Record, Value};

/// One row (or nested record) on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRow {
    pub f: Vec<WireCell>,
}

/// One positional cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCell {
    #[serde(default)]
    pub v: WireValue,
}

/// Cell payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    #[default]
    Null,
    Text(String),
    Row(WireRow),
    List(Vec<WireCell>),
}

impl WireValue {
    fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Row(_) => false,
        }
    }
}

impl From<&str> for WireCell {
    fn from(text: &str) -> Self {
        Self {
            v: WireValue::Text(text.to_string()),
        }
    }
}

/// Decode wire rows against `schema`.
///
/// # Errors
/// `UnsupportedType` when a present value belongs to an unsupported field,
/// `MalformedWire` when the row shape does not follow the schema,
/// `InvalidValue` when a leaf fails to coerce.
pub fn decode(rows: &[WireRow], schema: &Schema) -> Result<Table> {
    let records = rows
        .iter()
        .map(|row| decode_fields(&row.f, schema.fields(), "<row>"))
        .collect::<Result<Vec<_>>>()?;
    debug!(rows = records.len(), "decoded wire rows");
    Ok(Table::from_parts(records, schema.clone()))
}

#[derive(Deserialize)]
struct ResponseSchema {
    fields: Vec<CatalogField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResponseDocument {
    Rows(Vec<WireRow>),
    Response {
        #[serde(default)]
        rows: Vec<WireRow>,
        #[serde(default)]
        schema: Option<ResponseSchema>,
    },
}

impl ResponseDocument {
    fn into_parts(self) -> (Vec<WireRow>, Option<ResponseSchema>) {
        match self {
            Self::Rows(rows) => (rows, None),
            Self::Response { rows, schema } => (rows, schema),
        }
    }
}

/// Decode a JSON query response (a bare row array, or an object with `rows`)
/// against `schema`. A response without `rows` has no rows.
pub fn decode_response(json: &str, schema: &Schema) -> Result<Table> {
    let document: ResponseDocument = serde_json::from_str(json)?;
    let (rows, _) = document.into_parts();
    decode(&rows, schema)
}

/// Decode a JSON query response using the schema it carries under
/// `schema.fields`.
pub fn decode_query_response(json: &str) -> Result<Table> {
    let document: ResponseDocument = serde_json::from_str(json)?;
    let (rows, schema) = document.into_parts();
    let Some(schema) = schema else {
        return Err(FixtureError::MalformedWire {
            path: "<response>".to_string(),
            reason: "response carries no schema".to_string(),
        });
    };
    decode(&rows, &Schema::from_catalog(&schema.fields)?)
}

fn decode_fields(cells: &[WireCell], fields: &[SchemaField], path: &str) -> Result<Record> {
    if cells.len() != fields.len() {
        return Err(FixtureError::MalformedWire {
            path: path.to_string(),
            reason: format!("expected {} cells, found {}", fields.len(), cells.len()),
        });
    }

    let mut record = Record::new();
    for (field, cell) in fields.iter().zip(cells) {
        if let Some(value) = decode_value(&cell.v, field)? {
            record.insert(field.name(), value);
        }
    }
    Ok(record)
}

fn decode_value(value: &WireValue, field: &SchemaField) -> Result<Option<Value>> {
    if value.is_absent() {
        return Ok(None);
    }
    if let Some(LeafType::Unsupported(type_name)) = field.leaf_type() {
        return Err(FixtureError::UnsupportedType {
            path: field.qualified_path().to_string(),
            type_name: type_name.clone(),
        });
    }
    if !field.repeated() {
        return decode_element(value, field);
    }

    let WireValue::List(items) = value else {
        return Err(malformed(field, "expected a list for a repeated field"));
    };
    let mut elements = Vec::with_capacity(items.len());
    for item in items {
        if let Some(element) = decode_element(&item.v, field)? {
            elements.push(element);
        }
    }
    Ok((!elements.is_empty()).then_some(Value::Repeated(elements)))
}

fn decode_element(value: &WireValue, field: &SchemaField) -> Result<Option<Value>> {
    let path = field.qualified_path();
    match (field.shape(), value) {
        (_, value) if value.is_absent() => Ok(None),
        (FieldShape::Leaf(leaf), WireValue::Text(text)) => leaf.coerce(text, path).map(Some),
        (FieldShape::Composite(subfields), WireValue::Row(row)) => {
            let record = decode_fields(&row.f, subfields, path)?;
            // A repeated element keeps its slot even when empty.
            if record.is_empty() && !field.repeated() {
                Ok(None)
            } else {
                Ok(Some(Value::Record(record)))
            }
        }
        (FieldShape::Leaf(_), _) => Err(malformed(field, "expected a scalar value")),
        (FieldShape::Composite(_), _) => Err(malformed(field, "expected a record")),
    }
}

fn malformed(field: &SchemaField, reason: &str) -> FixtureError {
    FixtureError::MalformedWire {
        path: field.qualified_path().to_string(),
        reason: reason.to_string(),
    }
}
