//! Catalog field descriptors.
//!
//! The remote catalog describes a table as a list of
//! `{ name, type, mode, fields }` objects. [`CatalogField`] is that shape,
//! loadable from JSON or YAML, and the only way to build a [`Schema`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{FieldShape, LeafType, Schema, SchemaField};
use crate::error::{FixtureError, Result};

/// Field mode as reported by the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

/// One field of a catalog schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<CatalogField>,
}

impl CatalogField {
    /// A nullable field of the given catalog type.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            mode: Mode::Nullable,
            fields: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, "STRING")
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, "INTEGER")
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, "BOOLEAN")
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, "FLOAT")
    }

    pub fn record(name: impl Into<String>, fields: Vec<CatalogField>) -> Self {
        Self {
            fields,
            ..Self::new(name, "RECORD")
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn repeated(self) -> Self {
        self.with_mode(Mode::Repeated)
    }

    pub fn required(self) -> Self {
        self.with_mode(Mode::Required)
    }
}

enum TypeClass {
    Record,
    Leaf(LeafType),
}

fn classify(type_name: &str) -> TypeClass {
    match type_name.to_ascii_lowercase().as_str() {
        "record" | "struct" => TypeClass::Record,
        "string" => TypeClass::Leaf(LeafType::String),
        "integer" | "int64" => TypeClass::Leaf(LeafType::Integer),
        "boolean" | "bool" => TypeClass::Leaf(LeafType::Boolean),
        "float" | "float64" => TypeClass::Leaf(LeafType::Float),
        _ => TypeClass::Leaf(LeafType::Unsupported(type_name.to_string())),
    }
}

/// Either a bare field list or an object carrying one under `fields`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Fields(Vec<CatalogField>),
    Wrapped { fields: Vec<CatalogField> },
}

impl CatalogDocument {
    fn into_fields(self) -> Vec<CatalogField> {
        match self {
            Self::Fields(fields) | Self::Wrapped { fields } => fields,
        }
    }
}

impl Schema {
    /// Resolve catalog descriptors into a schema tree.
    ///
    /// # Errors
    /// `InvalidSchema` for a record without subfields, subfields on a
    /// non-record, or a qualified path that occurs twice.
    pub fn from_catalog(fields: &[CatalogField]) -> Result<Self> {
        let mut seen = HashSet::new();
        let fields = resolve_fields(fields, "", false, &mut seen)?;
        Ok(Schema::from_fields(fields))
    }

    /// Parse a JSON catalog descriptor (list, or object with `fields`).
    pub fn from_json(json: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::from_catalog(&document.into_fields())
    }

    /// Parse a YAML catalog descriptor (list, or mapping with `fields`).
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: CatalogDocument = serde_yaml::from_str(yaml)?;
        Self::from_catalog(&document.into_fields())
    }

    /// Convert back into catalog descriptors.
    pub fn to_catalog(&self) -> Vec<CatalogField> {
        self.fields().iter().map(to_catalog_field).collect()
    }
}

fn resolve_fields(
    fields: &[CatalogField],
    prefix: &str,
    in_repeated_ancestor: bool,
    seen: &mut HashSet<String>,
) -> Result<Vec<SchemaField>> {
    fields
        .iter()
        .map(|f| resolve_field(f, prefix, in_repeated_ancestor, seen))
        .collect()
}

fn resolve_field(
    field: &CatalogField,
    prefix: &str,
    in_repeated_ancestor: bool,
    seen: &mut HashSet<String>,
) -> Result<SchemaField> {
    let path = format!("{prefix}{}", field.name);
    if !seen.insert(path.clone()) {
        return Err(FixtureError::InvalidSchema {
            path,
            reason: "duplicate field".to_string(),
        });
    }

    let repeated = field.mode == Mode::Repeated;
    let branch_repeated = in_repeated_ancestor || repeated;

    let shape = match classify(&field.field_type) {
        TypeClass::Record => {
            if field.fields.is_empty() {
                return Err(FixtureError::InvalidSchema {
                    path,
                    reason: "record without subfields".to_string(),
                });
            }
            let prefix = format!("{path}.");
            FieldShape::Composite(resolve_fields(&field.fields, &prefix, branch_repeated, seen)?)
        }
        TypeClass::Leaf(leaf) => {
            if !field.fields.is_empty() {
                return Err(FixtureError::InvalidSchema {
                    path,
                    reason: format!("subfields on a {} field", field.field_type),
                });
            }
            FieldShape::Leaf(leaf)
        }
    };

    Ok(SchemaField::new(
        field.name.clone(),
        path,
        shape,
        field.mode == Mode::Nullable,
        repeated,
        branch_repeated,
    ))
}

fn to_catalog_field(field: &SchemaField) -> CatalogField {
    let field_type = match field.shape() {
        FieldShape::Composite(_) => "RECORD".to_string(),
        FieldShape::Leaf(LeafType::Unsupported(name)) => name.clone(),
        FieldShape::Leaf(leaf) => leaf.name().to_ascii_uppercase(),
    };
    let mode = if field.repeated() {
        Mode::Repeated
    } else if field.nullable() {
        Mode::Nullable
    } else {
        Mode::Required
    };
    CatalogField {
        name: field.name().to_string(),
        field_type,
        mode,
        fields: field.subfields().iter().map(to_catalog_field).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_wrapped_fields() {
        let json = r#"{
            "fields": [
                {"name": "repository", "type": "RECORD", "mode": "NULLABLE", "fields": [
                    {"name": "name", "type": "STRING"}
                ]},
                {"name": "payload", "type": "RECORD", "fields": [
                    {"name": "pages", "type": "RECORD", "mode": "REPEATED", "fields": [
                        {"name": "title", "type": "STRING", "description": "ignored"}
                    ]}
                ]}
            ]
        }"#;
        let schema = Schema::from_json(json).unwrap();
        assert_eq!(
            schema.column_names(),
            vec!["repository.name", "payload.pages.title"]
        );
        let title = schema.find("payload.pages.title").unwrap();
        assert!(title.nullable());
        assert!(!title.repeated());
        assert!(title.in_repeated_ancestor());
    }

    #[test]
    fn test_from_yaml_bare_list_with_aliases() {
        let yaml = r#"
- name: id
  type: INT64
  mode: REQUIRED
- name: tags
  type: struct
  mode: REPEATED
  fields:
    - name: key
      type: STRING
    - name: enabled
      type: BOOL
"#;
        let schema = Schema::from_yaml(yaml).unwrap();
        let id = schema.find("id").unwrap();
        assert_eq!(id.leaf_type(), Some(&LeafType::Integer));
        assert!(!id.nullable());
        assert_eq!(
            schema.find("tags.enabled").unwrap().leaf_type(),
            Some(&LeafType::Boolean)
        );
    }

    #[test]
    fn test_record_without_subfields_rejected() {
        let err = Schema::from_catalog(&[CatalogField::record("r", vec![])]).unwrap_err();
        assert_eq!(err.code(), "INVALID_SCHEMA");
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let err = Schema::from_catalog(&[CatalogField::string("a"), CatalogField::integer("a")])
            .unwrap_err();
        assert!(matches!(err, FixtureError::InvalidSchema { ref path, .. } if path == "a"));
    }

    #[test]
    fn test_to_catalog_inverts_from_catalog() {
        let fields = vec![
            CatalogField::string("c1").required(),
            CatalogField::record(
                "c2",
                vec![
                    CatalogField::integer("x").repeated(),
                    CatalogField::new("when", "TIMESTAMP"),
                ],
            )
            .repeated(),
        ];
        let schema = Schema::from_catalog(&fields).unwrap();
        assert_eq!(schema.to_catalog(), fields);
    }
}
