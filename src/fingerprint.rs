//! Content fingerprints for tables.
//!
//! ```text
//! SHA-256(canonical_json({data, schema}))
//!   → base64
//!   → drop non-alphanumerics
//!   → first FINGERPRINT_LEN characters
//! ```
//!
//! Records are `BTreeMap`-backed and the schema is serialized as catalog
//! descriptors in declaration order, so the canonical bytes do not depend on
//! how the table was built. The fingerprint names mock tables; it is not a
//! security boundary.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Value as Json};
use sha2::{Digest, Sha256};

use crate::schema::{CatalogField, Mode};
use crate::table::Table;
use crate::value::{Record, Value};

/// Default fingerprint length.
pub const FINGERPRINT_LEN: usize = 20;

/// Deterministic byte form of a table's data and schema.
///
/// Floats are written as `{"float": <bits>}` so non-finite values never
/// collapse onto JSON `null`.
pub fn canonical_bytes(table: &Table) -> Vec<u8> {
    let data: Vec<Json> = table.records().iter().map(canonical_record).collect();
    let schema: Vec<Json> = table.schema().to_catalog().iter().map(canonical_field).collect();
    json!({ "data": data, "schema": schema }).to_string().into_bytes()
}

fn canonical_record(record: &Record) -> Json {
    let map: Map<String, Json> = record
        .iter()
        .map(|(name, value)| (name.to_string(), canonical_value(value)))
        .collect();
    Json::Object(map)
}

fn canonical_value(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::String(s) => Json::String(s.clone()),
        Value::Integer(i) => Json::from(*i),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Float(x) => json!({ "float": x.to_bits() }),
        Value::Record(record) => canonical_record(record),
        Value::Repeated(items) => Json::Array(items.iter().map(canonical_value).collect()),
    }
}

fn canonical_field(field: &CatalogField) -> Json {
    let mode = match field.mode {
        Mode::Nullable => "NULLABLE",
        Mode::Required => "REQUIRED",
        Mode::Repeated => "REPEATED",
    };
    json!({
        "name": field.name,
        "type": field.field_type,
        "mode": mode,
        "fields": field.fields.iter().map(canonical_field).collect::<Vec<_>>(),
    })
}

/// Short, reproducible identifier for a table's content.
pub fn fingerprint(table: &Table) -> String {
    fingerprint_with_len(table, FINGERPRINT_LEN)
}

/// [`fingerprint`] truncated to `len` characters.
pub fn fingerprint_with_len(table: &Table, len: usize) -> String {
    let digest = Sha256::digest(canonical_bytes(table));
    STANDARD
        .encode(digest)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(len)
        .collect()
}
