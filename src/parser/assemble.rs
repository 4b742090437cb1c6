//! Record assembly from parsed rows.
//!
//! Every repeated level (the table itself, and each repeated composite field)
//! is driven by the same two-state machine. A row either opens a new element
//! or extends the last one, depending on the level's boundary test:
//!
//! ```text
//!            any row                 boundary fires
//!   Empty ─────────────► Building ◄────────────────┐
//!        (start element)     │    (start element)  │
//!                            └─────────────────────┘
//!                            │ subset of boundary columns
//!                            └──► extend last element
//! ```

use tracing::trace;

use super::row::RowValues;
use crate::error::Result;
use crate::schema::{boundary_columns, leaves, FieldShape, SchemaField};
use crate::value::{Record, Value};

/// True iff `row` supplies every boundary column of this level.
///
/// Boundary columns are the level's leaves outside any nested repeated field,
/// see [`boundary_columns`]. A level without boundary columns opens a new
/// element on every row.
pub fn is_new_record_boundary(fields: &[SchemaField], row: &RowValues) -> bool {
    boundary_columns(fields)
        .iter()
        .all(|field| row.contains_key(field.qualified_path()))
}

/// State of one repeated level before a row is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupState {
    /// No element yet.
    Empty,
    /// At least one element; the last one may be extended.
    Building,
}

/// What a row does to a repeated level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupStep {
    StartElement,
    ExtendLast,
}

impl GroupState {
    pub(crate) fn of(len: usize) -> Self {
        if len == 0 {
            Self::Empty
        } else {
            Self::Building
        }
    }

    pub(crate) fn step(self, boundary: bool) -> GroupStep {
        match (self, boundary) {
            (Self::Empty, _) | (Self::Building, true) => GroupStep::StartElement,
            (Self::Building, false) => GroupStep::ExtendLast,
        }
    }
}

/// Write the row's values for `fields` into `record`.
pub(crate) fn assemble(fields: &[SchemaField], row: &RowValues, record: &mut Record) -> Result<()> {
    for field in fields {
        assemble_field(field, row, record)?;
    }
    Ok(())
}

fn assemble_field(field: &SchemaField, row: &RowValues, record: &mut Record) -> Result<()> {
    match field.shape() {
        FieldShape::Leaf(leaf) => {
            let Some(raw) = row.get(field.qualified_path()) else {
                return Ok(());
            };
            let value = leaf.coerce(raw, field.qualified_path())?;
            if field.repeated() {
                record.push_repeated(field.name(), value);
            } else {
                record.insert(field.name(), value);
            }
            Ok(())
        }
        FieldShape::Composite(subfields) => {
            if !touches(subfields, row) {
                return Ok(());
            }
            if !field.repeated() {
                return assemble(subfields, row, record.nested_mut(field.name()));
            }

            let state = GroupState::of(record.repeated_len(field.name()));
            let boundary = is_new_record_boundary(subfields, row);
            let step = state.step(boundary);
            trace!(path = field.qualified_path(), ?state, boundary, ?step, "repeated group");

            if step == GroupStep::ExtendLast {
                if let Some(last) = record.last_element_mut(field.name()) {
                    return assemble(subfields, row, last);
                }
            }
            let mut element = Record::new();
            assemble(subfields, row, &mut element)?;
            record.push_repeated(field.name(), Value::Record(element));
            Ok(())
        }
    }
}

/// Whether the row has any value under these fields.
fn touches(fields: &[SchemaField], row: &RowValues) -> bool {
    leaves(fields)
        .iter()
        .any(|leaf| row.contains_key(leaf.qualified_path()))
}
