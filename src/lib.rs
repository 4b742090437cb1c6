//! Nested Fixtures - column-aligned text fixtures for nested, repeated tables.
//!
//! Hierarchical column stores hold records whose fields can themselves be
//! records, and where any field may repeat. This crate converts between such
//! record trees and a flat, column-aligned text form that is easy to write by
//! hand and easy to diff:
//!
//! - `schema` - typed field tree, catalog descriptors, narrowing
//! - `parser` - fixture text → [`Table`]
//! - `wire` - query-result rows → [`Table`]
//! - `flatten` / `render` - [`Table`] → aligned text
//! - `fingerprint` - short content id used to name mock tables
//! - `reference` - table references and query rewriting for mocks
//!
//! # Architecture
//!
//! ```text
//!  fixture text ──build_table──┐
//!                              ├──► Table { records, schema }
//!  wire rows ─────decode───────┘            │
//!                                           ├── flatten ──► FlatTable ── render ──► text
//!                                           └── fingerprint ──► short id
//! ```
//!
//! `render(flatten(build_table(text)))` reproduces normalized fixture text,
//! so two tables are compared by rendering both on a common grid.
//!
//! # Example
//!
//! ```
//! use nested_fixtures::{build_table, CatalogField, Schema};
//!
//! let schema = Schema::from_catalog(&[
//!     CatalogField::string("c1"),
//!     CatalogField::record(
//!         "c2",
//!         vec![CatalogField::integer("x").repeated(), CatalogField::string("y")],
//!     )
//!     .repeated(),
//! ])
//! .unwrap();
//!
//! let text = "
//! c1   c2.x  c2.y
//! foo  1     a
//!      2
//!      3     b
//! bar        c
//! ";
//! let table = build_table(text, &schema).unwrap();
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.to_string(), text.trim_matches('\n'));
//! ```

pub mod config;
mod error;
pub mod fingerprint;
pub mod flatten;
pub mod parser;
pub mod reference;
pub mod render;
pub mod schema;
pub mod source;
pub mod table;
mod value;
pub mod wire;

// Re-exports
pub use config::FixtureConfig;
pub use error::{FixtureError, Result};
pub use fingerprint::fingerprint;
pub use flatten::{flatten, FlatTable};
pub use parser::build_table;
pub use reference::{mock_table_name, rewrite_query, QueryContext, TableRef};
pub use render::{column_widths, render, union_widths, DEFAULT_MIN_SPACING};
pub use schema::{narrow, CatalogField, FieldShape, LeafType, Mode, Schema, SchemaField};
pub use source::{DirectorySchemaSource, SchemaSource};
pub use table::{compare, compare_to_fixture, tables_equal, Table, TableComparison};
pub use value::{Record, Value, NULL_MARKER};
pub use wire::{decode, decode_query_response, decode_response, WireCell, WireRow, WireValue};
