//! Record tree values.
//!
//! A [`Record`] maps field names to [`Value`]s. Keys are kept in a `BTreeMap`
//! so serialization and hashing never depend on insertion order. A missing
//! key means "no value"; [`Value::Null`] is the explicit `null` marker and
//! survives every conversion as a distinct value.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, Result};
use crate::schema::LeafType;

/// Cell text that denotes an explicit null.
pub const NULL_MARKER: &str = "null";

/// A single value in a record tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit null, distinct from an absent key.
    Null,
    String(String),
    Integer(i64),
    Boolean(bool),
    Float(f64),
    /// A non-repeated composite field.
    Record(Record),
    /// A repeated field: primitives or records.
    Repeated(Vec<Value>),
}

impl Value {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&[Value]> {
        match self {
            Self::Repeated(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(NULL_MARKER),
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Boolean(b) => write!(f, "{b}"),
            // Debug keeps the fractional part ("1.0") and round-trips through parse.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Record(_) | Self::Repeated(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Repeated(items.into_iter().map(Into::into).collect())
    }
}

/// Field name → value mapping for one level of a record tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Append to a repeated field, creating it if absent.
    pub(crate) fn push_repeated(&mut self, name: &str, value: Value) {
        match self.0.get_mut(name) {
            Some(Value::Repeated(items)) => items.push(value),
            _ => {
                self.0.insert(name.to_string(), Value::Repeated(vec![value]));
            }
        }
    }

    /// Number of elements currently held by a repeated field.
    pub(crate) fn repeated_len(&self, name: &str) -> usize {
        self.get(name)
            .and_then(Value::as_repeated)
            .map_or(0, <[Value]>::len)
    }

    /// Last element of a repeated composite field.
    pub(crate) fn last_element_mut(&mut self, name: &str) -> Option<&mut Record> {
        match self.0.get_mut(name) {
            Some(Value::Repeated(items)) => match items.last_mut() {
                Some(Value::Record(record)) => Some(record),
                _ => None,
            },
            _ => None,
        }
    }

    /// Nested record of a non-repeated composite field, created empty if absent.
    pub(crate) fn nested_mut(&mut self, name: &str) -> &mut Record {
        let slot = self
            .0
            .entry(name.to_string())
            .or_insert_with(|| Value::Record(Record::new()));
        if !matches!(slot, Value::Record(_)) {
            *slot = Value::Record(Record::new());
        }
        match slot {
            Value::Record(record) => record,
            _ => unreachable!("slot was just set to a record"),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl LeafType {
    /// Convert cell text into a typed value.
    ///
    /// `null` becomes [`Value::Null`] for every supported type. Booleans are
    /// true when the text starts with `t` in any case.
    ///
    /// # Errors
    /// `UnsupportedType` for unsupported leaf types, `InvalidValue` when
    /// integer or float parsing fails.
    pub fn coerce(&self, raw: &str, path: &str) -> Result<Value> {
        let invalid = |expected| FixtureError::InvalidValue {
            column: path.to_string(),
            value: raw.to_string(),
            expected,
        };
        match self {
            Self::Unsupported(type_name) => Err(FixtureError::UnsupportedType {
                path: path.to_string(),
                type_name: type_name.clone(),
            }),
            _ if raw == NULL_MARKER => Ok(Value::Null),
            Self::String => Ok(Value::String(raw.to_string())),
            Self::Integer => raw
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| invalid("integer")),
            Self::Boolean => Ok(Value::Boolean(raw.to_lowercase().starts_with('t'))),
            Self::Float => raw
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| invalid("float")),
        }
    }
}
