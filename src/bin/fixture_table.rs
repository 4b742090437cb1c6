//! fixture-table - inspect and normalise nested table fixtures
//!
//! Usage:
//!   cargo run --features cli --bin fixture-table -- <command> ...
//!
//! Examples:
//!   # Re-align a fixture in place
//!   fixture-table fmt schemas/ds/events.json tests/fixtures/events.txt --write
//!
//!   # Schema looked up as <schema_dir>/ds/events.{json,yaml,yml}
//!   fixture-table check ds.events tests/fixtures/events.txt
//!
//!   # Compare a query result against the expected fixture
//!   fixture-table diff ds.events actual.txt expected.txt
//!
//!   # Point a query at mock tables
//!   fixture-table rewrite query.sql --mock ds.events=tests/fixtures/events.txt

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use nested_fixtures::fingerprint::fingerprint_with_len;
use nested_fixtures::source::load_schema_file;
use nested_fixtures::{
    build_table, compare_to_fixture, decode_query_response, decode_response, rewrite_query,
    FixtureConfig, Schema, SchemaSource, Table, TableRef,
};

#[derive(Parser, Debug)]
#[command(name = "fixture-table")]
#[command(about = "Parse, render and compare column-aligned nested table fixtures")]
struct Cli {
    /// Config file (default: ./nested-fixtures.yaml if present)
    #[arg(long, global = true, env = "NESTED_FIXTURES_CONFIG")]
    config: Option<PathBuf>,

    /// Spaces between rendered columns (overrides the config)
    #[arg(long, global = true)]
    min_spacing: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a fixture and print it re-aligned
    Fmt {
        /// Schema file, or a dataset.table reference under the schema dir
        schema: String,
        fixture: PathBuf,
        /// Rewrite the fixture file instead of printing
        #[arg(long, short = 'w')]
        write: bool,
    },

    /// Parse a fixture and report the first error
    Check { schema: String, fixture: PathBuf },

    /// Print a fixture's content fingerprint
    Fingerprint {
        schema: String,
        fixture: PathBuf,
        /// Print the mock table name for this table reference instead
        #[arg(long, short = 't')]
        table: Option<String>,
    },

    /// Render a JSON query response as fixture text
    Decode {
        response: PathBuf,
        /// Decode against this schema instead of the one in the response
        #[arg(long, short = 's')]
        schema: Option<String>,
    },

    /// Compare two fixtures; exits 1 when they differ
    Diff {
        schema: String,
        actual: PathBuf,
        expected: PathBuf,
    },

    /// Replace mocked table references in a query
    Rewrite {
        query: PathBuf,
        /// Mocked table in format table_ref=fixture (can be specified multiple times)
        #[arg(long, short = 'm', value_parser = parse_mock)]
        mock: Vec<(String, PathBuf)>,
    },
}

/// Parse table_ref=fixture pairs from the command line
fn parse_mock(s: &str) -> Result<(String, PathBuf), String> {
    let (table, fixture) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid table_ref=fixture pair: {s}"))?;
    Ok((table.to_string(), PathBuf::from(fixture)))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => FixtureConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FixtureConfig::from_env().context("Failed to resolve config")?,
    };
    if let Some(min_spacing) = cli.min_spacing {
        config.min_spacing = min_spacing;
    }

    match cli.command {
        Command::Fmt {
            schema,
            fixture,
            write,
        } => fmt(&config, &schema, &fixture, write),
        Command::Check { schema, fixture } => check(&config, &schema, &fixture),
        Command::Fingerprint {
            schema,
            fixture,
            table,
        } => fingerprint(&config, &schema, &fixture, table.as_deref()),
        Command::Decode { response, schema } => decode(&config, &response, schema.as_deref()),
        Command::Diff {
            schema,
            actual,
            expected,
        } => diff(&config, &schema, &actual, &expected),
        Command::Rewrite { query, mock } => rewrite(&config, &query, &mock),
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// A schema argument is a file path when one exists, otherwise a table
/// reference resolved through the configured schema directory.
fn load_schema(config: &FixtureConfig, schema: &str) -> Result<Schema> {
    let path = Path::new(schema);
    if path.is_file() {
        return load_schema_file(path)
            .with_context(|| format!("Failed to load schema {}", path.display()));
    }
    let table_ref = TableRef::parse(schema)?;
    config
        .schema_source()
        .load_schema(&table_ref)
        .with_context(|| format!("Failed to load schema for {table_ref}"))
}

fn load_fixture(config: &FixtureConfig, schema: &str, fixture: &Path) -> Result<Table> {
    let schema = load_schema(config, schema)?;
    build_table(&read(fixture)?, &schema)
        .with_context(|| format!("Failed to parse {}", fixture.display()))
}

fn fmt(config: &FixtureConfig, schema: &str, fixture: &Path, write: bool) -> Result<()> {
    let table = load_fixture(config, schema, fixture)?;
    let text = table.prettyprint(None, config.min_spacing);
    if write {
        std::fs::write(fixture, format!("{text}\n"))
            .with_context(|| format!("Failed to write {}", fixture.display()))?;
    } else {
        println!("{text}");
    }
    Ok(())
}

fn check(config: &FixtureConfig, schema: &str, fixture: &Path) -> Result<()> {
    let schema = load_schema(config, schema)?;
    match build_table(&read(fixture)?, &schema) {
        Ok(table) => {
            println!("{}: {} records", fixture.display(), table.len());
            Ok(())
        }
        Err(err) => {
            eprintln!("{}: [{}] {err}", fixture.display(), err.code());
            std::process::exit(1);
        }
    }
}

fn fingerprint(
    config: &FixtureConfig,
    schema: &str,
    fixture: &Path,
    table_ref: Option<&str>,
) -> Result<()> {
    let table = load_fixture(config, schema, fixture)?;
    match table_ref {
        Some(reference) => {
            let table_ref = TableRef::parse(reference)?;
            println!("{}", config.mock_table_name(&table_ref, &table));
        }
        None => println!("{}", fingerprint_with_len(&table, config.fingerprint_len)),
    }
    Ok(())
}

fn decode(config: &FixtureConfig, response: &Path, schema: Option<&str>) -> Result<()> {
    let json = read(response)?;
    let table = match schema {
        Some(schema) => decode_response(&json, &load_schema(config, schema)?)?,
        None => decode_query_response(&json)?,
    };
    println!("{}", table.prettyprint(None, config.min_spacing));
    Ok(())
}

fn diff(config: &FixtureConfig, schema: &str, actual: &Path, expected: &Path) -> Result<()> {
    let actual_table = load_fixture(config, schema, actual)?;
    let comparison = compare_to_fixture(&actual_table, &read(expected)?)
        .with_context(|| format!("Failed to parse {}", expected.display()))?;
    if !comparison.is_equal() {
        eprint!("{comparison}");
        std::process::exit(1);
    }
    Ok(())
}

fn rewrite(config: &FixtureConfig, query: &Path, mocks: &[(String, PathBuf)]) -> Result<()> {
    let ctx = config
        .query_context()
        .ok_or_else(|| anyhow!("rewrite needs `project` and `dataset` in the config"))?;
    if mocks.is_empty() {
        bail!("no --mock tables given");
    }

    let source = config.schema_source();
    let mut names = HashMap::new();
    for (reference, fixture) in mocks {
        let table_ref = TableRef::parse(reference)?;
        let schema = source
            .load_schema(&table_ref)
            .with_context(|| format!("Failed to load schema for {table_ref}"))?;
        let table = build_table(&read(fixture)?, &schema)
            .with_context(|| format!("Failed to parse {}", fixture.display()))?;
        names.insert(table_ref.clone(), config.mock_table_name(&table_ref, &table));
    }

    print!("{}", rewrite_query(&read(query)?, &names, &ctx));
    Ok(())
}
