//! Schema model - the typed field tree behind every fixture.
//!
//! A [`Schema`] is an ordered list of [`SchemaField`]s. Each field is either a
//! leaf with a primitive [`LeafType`] or a composite holding further fields:
//!
//! ```text
//! Schema
//! ├── c1            Leaf(String)
//! └── c2            Composite, repeated
//!     ├── c2.x      Composite, repeated
//!     │   └── c2.x.xx   Leaf(Integer)
//!     └── c2.y      Leaf(String)
//! ```
//!
//! Qualified paths and the `in_repeated_ancestor` flag are computed once, top
//! down, when the schema is resolved from catalog descriptors, and never
//! change afterwards.

pub mod catalog;
mod narrow;

pub use catalog::{CatalogField, Mode};
pub use narrow::narrow;

use crate::error::{FixtureError, Result};

/// Primitive type of a leaf field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LeafType {
    String,
    Integer,
    Boolean,
    Float,
    /// A catalog type this crate cannot convert, kept by name so the field can
    /// still be narrowed away.
    Unsupported(String),
}

impl LeafType {
    /// Lower-case type name, as written in error messages.
    pub fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

/// Leaf-or-composite shape of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    Leaf(LeafType),
    /// Non-empty, in declaration order.
    Composite(Vec<SchemaField>),
}

/// One node of the schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    name: String,
    qualified_path: String,
    shape: FieldShape,
    nullable: bool,
    repeated: bool,
    in_repeated_ancestor: bool,
}

impl SchemaField {
    pub(crate) fn new(
        name: String,
        qualified_path: String,
        shape: FieldShape,
        nullable: bool,
        repeated: bool,
        in_repeated_ancestor: bool,
    ) -> Self {
        Self {
            name,
            qualified_path,
            shape,
            nullable,
            repeated,
            in_repeated_ancestor,
        }
    }

    /// Local name within the parent level.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dot-joined path from the schema root, e.g. `c2.x.xx`.
    pub fn qualified_path(&self) -> &str {
        &self.qualified_path
    }

    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn repeated(&self) -> bool {
        self.repeated
    }

    /// True if this field or any ancestor is repeated.
    pub fn in_repeated_ancestor(&self) -> bool {
        self.in_repeated_ancestor
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.shape, FieldShape::Leaf(_))
    }

    pub fn leaf_type(&self) -> Option<&LeafType> {
        match &self.shape {
            FieldShape::Leaf(leaf) => Some(leaf),
            FieldShape::Composite(_) => None,
        }
    }

    /// Subfields of a composite; empty for leaves.
    pub fn subfields(&self) -> &[SchemaField] {
        match &self.shape {
            FieldShape::Leaf(_) => &[],
            FieldShape::Composite(fields) => fields,
        }
    }

    /// Type name as used by the catalog in lower case (`record` for composites).
    pub fn type_name(&self) -> &str {
        match &self.shape {
            FieldShape::Leaf(leaf) => leaf.name(),
            FieldShape::Composite(_) => "record",
        }
    }

    /// Same field with its subfields replaced.
    pub(crate) fn with_subfields(&self, subfields: Vec<SchemaField>) -> Self {
        Self {
            shape: FieldShape::Composite(subfields),
            ..self.clone()
        }
    }
}

/// Every leaf under `fields`, depth first, in declaration order.
pub fn leaves(fields: &[SchemaField]) -> Vec<&SchemaField> {
    let mut out = Vec::new();
    collect_leaves(fields, &mut out);
    out
}

fn collect_leaves<'a>(fields: &'a [SchemaField], out: &mut Vec<&'a SchemaField>) {
    for field in fields {
        match &field.shape {
            FieldShape::Leaf(_) => out.push(field),
            FieldShape::Composite(subfields) => collect_leaves(subfields, out),
        }
    }
}

/// Qualified paths of [`leaves`]: the canonical column order.
pub fn column_names(fields: &[SchemaField]) -> Vec<String> {
    leaves(fields)
        .into_iter()
        .map(|f| f.qualified_path.clone())
        .collect()
}

/// Leaves that must all be present for a row to open a new element at this
/// level.
///
/// Descends through non-repeated composites but never into repeated fields,
/// so at the schema root this is every leaf outside a repeated branch.
pub fn boundary_columns(fields: &[SchemaField]) -> Vec<&SchemaField> {
    let mut out = Vec::new();
    collect_boundary_columns(fields, &mut out);
    out
}

fn collect_boundary_columns<'a>(fields: &'a [SchemaField], out: &mut Vec<&'a SchemaField>) {
    for field in fields.iter().filter(|f| !f.repeated) {
        match &field.shape {
            FieldShape::Leaf(_) => out.push(field),
            FieldShape::Composite(subfields) => collect_boundary_columns(subfields, out),
        }
    }
}

/// A resolved schema tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Schema {
    pub(crate) fn from_fields(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    /// Top-level fields in declaration order.
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn leaves(&self) -> Vec<&SchemaField> {
        leaves(&self.fields)
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.fields)
    }

    /// Look up any field, leaf or composite, by qualified path.
    pub fn find(&self, path: &str) -> Option<&SchemaField> {
        find_in(&self.fields, path)
    }

    /// Fail with [`FixtureError::UnsupportedType`] on the first leaf whose
    /// type cannot be converted.
    pub fn ensure_supported(&self) -> Result<()> {
        for leaf in self.leaves() {
            if let FieldShape::Leaf(LeafType::Unsupported(name)) = &leaf.shape {
                return Err(FixtureError::UnsupportedType {
                    path: leaf.qualified_path.clone(),
                    type_name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn find_in<'a>(fields: &'a [SchemaField], path: &str) -> Option<&'a SchemaField> {
    for field in fields {
        if field.qualified_path == path {
            return Some(field);
        }
        let prefix_matches = path
            .strip_prefix(field.qualified_path.as_str())
            .is_some_and(|rest| rest.starts_with('.'));
        if prefix_matches {
            return find_in(field.subfields(), path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_schema() -> Schema {
        Schema::from_catalog(&[
            CatalogField::string("c1"),
            CatalogField::record(
                "c2",
                vec![
                    CatalogField::record("x", vec![CatalogField::integer("xx")]).repeated(),
                    CatalogField::string("y"),
                ],
            )
            .repeated(),
            CatalogField::record(
                "c3",
                vec![CatalogField::boolean("flag"), CatalogField::float("ratio")],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_names_depth_first() {
        let schema = nested_schema();
        assert_eq!(
            schema.column_names(),
            vec!["c1", "c2.x.xx", "c2.y", "c3.flag", "c3.ratio"]
        );
    }

    #[test]
    fn test_repeated_ancestor_propagates() {
        let schema = nested_schema();
        assert!(!schema.find("c1").unwrap().in_repeated_ancestor());
        assert!(schema.find("c2").unwrap().in_repeated_ancestor());
        assert!(schema.find("c2.x.xx").unwrap().in_repeated_ancestor());
        assert!(schema.find("c2.y").unwrap().in_repeated_ancestor());
        assert!(!schema.find("c3.flag").unwrap().in_repeated_ancestor());
    }

    #[test]
    fn test_boundary_columns_per_level() {
        let schema = nested_schema();
        let root: Vec<_> = boundary_columns(schema.fields())
            .into_iter()
            .map(SchemaField::qualified_path)
            .collect();
        assert_eq!(root, vec!["c1", "c3.flag", "c3.ratio"]);

        let c2 = schema.find("c2").unwrap();
        let group: Vec<_> = boundary_columns(c2.subfields())
            .into_iter()
            .map(SchemaField::qualified_path)
            .collect();
        assert_eq!(group, vec!["c2.y"]);
    }

    #[test]
    fn test_find_does_not_match_name_prefixes() {
        let schema = Schema::from_catalog(&[
            CatalogField::string("c"),
            CatalogField::record("c2", vec![CatalogField::string("a")]),
        ])
        .unwrap();
        assert_eq!(schema.find("c2.a").unwrap().name(), "a");
        assert!(schema.find("c.a").is_none());
    }

    #[test]
    fn test_ensure_supported_reports_path() {
        let schema = Schema::from_catalog(&[
            CatalogField::string("c1"),
            CatalogField::new("ts", "TIMESTAMP"),
        ])
        .unwrap();
        let err = schema.ensure_supported().unwrap_err();
        assert!(matches!(
            err,
            FixtureError::UnsupportedType { ref path, ref type_name }
                if path == "ts" && type_name == "TIMESTAMP"
        ));
    }
}
