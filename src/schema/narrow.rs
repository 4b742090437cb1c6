//! Schema narrowing: prune a schema down to the columns a fixture declares.

use std::collections::BTreeSet;

use super::{FieldShape, Schema, SchemaField};
use crate::error::{FixtureError, Result};

impl Schema {
    /// Keep only the fields named in `wanted`, plus the composites that lead
    /// to them.
    ///
    /// A composite survives when at least one descendant is wanted, with its
    /// subfields narrowed the same way. Naming a composite path directly keeps
    /// its whole subtree. Surviving fields keep schema order, not the order of
    /// `wanted`.
    ///
    /// # Errors
    /// `UnknownColumn` if a wanted path is not a field of this schema.
    pub fn narrow<S: AsRef<str>>(&self, wanted: &[S]) -> Result<Schema> {
        let wanted: BTreeSet<&str> = wanted.iter().map(AsRef::as_ref).collect();
        if let Some(unknown) = wanted.iter().find(|path| self.find(path).is_none()) {
            return Err(FixtureError::UnknownColumn {
                column: (*unknown).to_string(),
            });
        }
        Ok(Schema::from_fields(narrow_fields(self.fields(), &wanted)))
    }
}

/// Free-function form of [`Schema::narrow`].
pub fn narrow<S: AsRef<str>>(schema: &Schema, wanted: &[S]) -> Result<Schema> {
    schema.narrow(wanted)
}

fn narrow_fields(fields: &[SchemaField], wanted: &BTreeSet<&str>) -> Vec<SchemaField> {
    fields
        .iter()
        .filter_map(|field| narrow_field(field, wanted))
        .collect()
}

fn narrow_field(field: &SchemaField, wanted: &BTreeSet<&str>) -> Option<SchemaField> {
    if let FieldShape::Composite(subfields) = field.shape() {
        let kept = narrow_fields(subfields, wanted);
        if !kept.is_empty() {
            return Some(field.with_subfields(kept));
        }
    }
    wanted
        .contains(field.qualified_path())
        .then(|| field.clone())
}
