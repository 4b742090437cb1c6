//! Fixture configuration.
//!
//! ```yaml
//! min_spacing: 2
//! fingerprint_len: 20
//! table_prefix: fixture_mock
//! schema_dir: schemas
//! project: my-project
//! dataset: my_dataset
//! legacy_sql: false
//! ```
//!
//! Every key is optional. [`FixtureConfig::from_env`] resolves the file:
//!
//! 1. `NESTED_FIXTURES_CONFIG` (explicit path, must exist)
//! 2. `nested-fixtures.yaml` in the working directory
//! 3. built-in defaults
//!
//! `NESTED_FIXTURES_SCHEMA_DIR` then overrides `schema_dir`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::fingerprint::FINGERPRINT_LEN;
use crate::reference::{mock_table_name_with_len, QueryContext, TableRef};
use crate::render::DEFAULT_MIN_SPACING;
use crate::source::DirectorySchemaSource;
use crate::table::Table;

pub const CONFIG_ENV: &str = "NESTED_FIXTURES_CONFIG";
pub const SCHEMA_DIR_ENV: &str = "NESTED_FIXTURES_SCHEMA_DIR";
pub const DEFAULT_CONFIG_FILE: &str = "nested-fixtures.yaml";
pub const DEFAULT_TABLE_PREFIX: &str = "fixture_mock";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureConfig {
    /// Spaces between rendered columns.
    pub min_spacing: usize,
    /// Characters kept from a fingerprint.
    pub fingerprint_len: usize,
    /// Prefix of generated mock table names.
    pub table_prefix: String,
    /// Root of the schema directory.
    pub schema_dir: PathBuf,
    /// Default project for table references, and home of mock tables.
    pub project: Option<String>,
    /// Dataset holding mock tables.
    pub dataset: Option<String>,
    /// Quote rewritten references as `[p:d.t]` instead of `` `p.d.t` ``.
    pub legacy_sql: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            min_spacing: DEFAULT_MIN_SPACING,
            fingerprint_len: FINGERPRINT_LEN,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            schema_dir: PathBuf::from("schemas"),
            project: None,
            dataset: None,
            legacy_sql: false,
        }
    }
}

impl FixtureConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading fixture configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Resolve configuration from the environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            Path::new(DEFAULT_CONFIG_FILE),
            std::env::var_os(SCHEMA_DIR_ENV).map(PathBuf::from),
        )
    }

    fn resolve(
        explicit: Option<PathBuf>,
        fallback: &Path,
        schema_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(&path)?,
            None if fallback.is_file() => Self::load(fallback)?,
            None => Self::default(),
        };
        if let Some(dir) = schema_dir {
            config.schema_dir = dir;
        }
        Ok(config)
    }

    pub fn schema_source(&self) -> DirectorySchemaSource {
        DirectorySchemaSource::new(&self.schema_dir)
    }

    /// Query rewriting context; needs both `project` and `dataset`.
    pub fn query_context(&self) -> Option<QueryContext> {
        let project = self.project.as_deref()?;
        let dataset = self.dataset.as_deref()?;
        Some(QueryContext::new(project, dataset).with_legacy_sql(self.legacy_sql))
    }

    /// Mock table name using the configured prefix and fingerprint length.
    pub fn mock_table_name(&self, table_ref: &TableRef, table: &Table) -> String {
        mock_table_name_with_len(&self.table_prefix, table_ref, table, self.fingerprint_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_for_empty_document() {
        assert_eq!(FixtureConfig::from_yaml("{}").unwrap(), FixtureConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = FixtureConfig::from_yaml("min_spacing: 4\nlegacy_sql: true\n").unwrap();
        assert_eq!(config.min_spacing, 4);
        assert!(config.legacy_sql);
        assert_eq!(config.table_prefix, DEFAULT_TABLE_PREFIX);
        assert_eq!(config.fingerprint_len, FINGERPRINT_LEN);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FixtureConfig::from_yaml("min_spacnig: 4\n").unwrap_err();
        assert_eq!(err.code(), "YAML");
    }

    #[test]
    fn test_resolve_order() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("explicit.yaml");
        let fallback = temp.path().join("nested-fixtures.yaml");
        std::fs::write(&explicit, "table_prefix: explicit\n").unwrap();
        std::fs::write(&fallback, "table_prefix: fallback\n").unwrap();

        let config = FixtureConfig::resolve(Some(explicit), &fallback, None).unwrap();
        assert_eq!(config.table_prefix, "explicit");

        let config = FixtureConfig::resolve(None, &fallback, Some("elsewhere".into())).unwrap();
        assert_eq!(config.table_prefix, "fallback");
        assert_eq!(config.schema_dir, PathBuf::from("elsewhere"));

        let missing = temp.path().join("missing.yaml");
        let config = FixtureConfig::resolve(None, &missing, None).unwrap();
        assert_eq!(config, FixtureConfig::default());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yaml");
        let err = FixtureConfig::resolve(Some(missing.clone()), &missing, None).unwrap_err();
        assert_eq!(err.code(), "IO");
    }

    #[test]
    fn test_query_context_needs_project_and_dataset() {
        let mut config = FixtureConfig {
            project: Some("p".into()),
            ..FixtureConfig::default()
        };
        assert!(config.query_context().is_none());

        config.dataset = Some("d".into());
        config.legacy_sql = true;
        let ctx = config.query_context().unwrap();
        assert_eq!(ctx.mock_table_id("m"), "[p:d.m]");
    }
}
