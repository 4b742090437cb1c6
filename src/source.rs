//! Where schemas come from.
//!
//! The remote catalog is out of reach for this crate, so schema lookup goes
//! through [`SchemaSource`]. [`DirectorySchemaSource`] serves catalog
//! descriptors checked in next to the fixtures:
//!
//! ```text
//! schemas/
//! └── my_dataset/
//!     ├── events.json
//!     └── users.yaml
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{FixtureError, Result};
use crate::reference::TableRef;
use crate::schema::Schema;

/// Resolves a table reference to its schema.
pub trait SchemaSource {
    fn load_schema(&self, table: &TableRef) -> Result<Schema>;
}

/// Schema files laid out as `<root>/<dataset>/<table>.{json,yaml,yml}`.
#[derive(Debug, Clone)]
pub struct DirectorySchemaSource {
    root: PathBuf,
}

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

impl DirectorySchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First existing schema file for `table`, in extension order.
    pub fn schema_path(&self, table: &TableRef) -> Option<PathBuf> {
        let dir = self.root.join(&table.dataset);
        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{ext}", table.table)))
            .find(|path| path.is_file())
    }
}

impl SchemaSource for DirectorySchemaSource {
    fn load_schema(&self, table: &TableRef) -> Result<Schema> {
        let Some(path) = self.schema_path(table) else {
            return Err(FixtureError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "no schema file for {table} under {}",
                    self.root.join(&table.dataset).display()
                ),
            )));
        };
        load_schema_file(&path)
    }
}

/// Load a catalog descriptor file; JSON or YAML by extension.
pub fn load_schema_file(path: &Path) -> Result<Schema> {
    let content = std::fs::read_to_string(path)?;
    let schema = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Schema::from_json(&content)?,
        _ => Schema::from_yaml(&content)?,
    };
    info!(path = %path.display(), columns = schema.column_names().len(), "loaded schema");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_loads_json_schema() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "ds/events.json",
            r#"[{"name": "id", "type": "INTEGER", "mode": "REQUIRED"},
                {"name": "tags", "type": "STRING", "mode": "REPEATED"}]"#,
        );

        let source = DirectorySchemaSource::new(temp.path());
        let schema = source
            .load_schema(&TableRef::parse("proj.ds.events").unwrap())
            .unwrap();
        assert_eq!(schema.column_names(), vec!["id", "tags"]);
        assert!(schema.find("tags").unwrap().repeated());
    }

    #[test]
    fn test_loads_wrapped_yaml_schema() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "ds/users.yml",
            r#"
fields:
  - name: name
    type: STRING
  - name: address
    type: RECORD
    fields:
      - name: city
        type: STRING
"#,
        );

        let source = DirectorySchemaSource::new(temp.path());
        let schema = source
            .load_schema(&TableRef::new(None, "ds", "users"))
            .unwrap();
        assert_eq!(schema.column_names(), vec!["name", "address.city"]);
    }

    #[test]
    fn test_missing_schema_is_io_error() {
        let temp = TempDir::new().unwrap();
        let source = DirectorySchemaSource::new(temp.path());
        let err = source
            .load_schema(&TableRef::new(None, "ds", "nope"))
            .unwrap_err();
        assert_eq!(err.code(), "IO");
        assert!(err.to_string().contains("ds.nope"));
    }
}
