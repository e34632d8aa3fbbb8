//! CLI command implementations.

pub mod apply;
pub mod classify;
pub mod join;
pub mod learn;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tabulax::input::{column_values, records_from_json_file, write_delimited, write_json};
use tabulax::{ExampleSet, OracleConfig, OracleProvider, Parser, Record, Tabulax};

use crate::cli::OutputFormat;

/// Provider selection from the global flags.
pub struct OracleChoice {
    pub provider: String,
    pub model: Option<String>,
}

impl OracleChoice {
    /// Build a `Tabulax` wired to the chosen oracle.
    pub fn connect(&self) -> Result<Tabulax, Box<dyn Error>> {
        let provider: OracleProvider = self.provider.parse()?;
        let mut config = OracleConfig::from_env(provider)?;
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        Ok(Tabulax::from_oracle_config(&config)?)
    }
}

/// Read a table from CSV/TSV, or from JSON when the extension says so.
pub fn load_records(path: &Path) -> Result<Vec<Record>, Box<dyn Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(records_from_json_file(path)?)
    } else {
        Ok(Parser::new().parse_file(path)?.to_records())
    }
}

/// Read example pairs from two columns of a table.
pub fn load_examples(
    path: &Path,
    source_column: &str,
    target_column: &str,
) -> Result<ExampleSet, Box<dyn Error>> {
    let records = load_records(path)?;
    for column in [source_column, target_column] {
        if !records.iter().any(|r| r.contains_key(column)) {
            return Err(format!("Column '{}' not found in {}", column, path.display()).into());
        }
    }
    let examples = ExampleSet::from_columns(
        &column_values(&records, source_column),
        &column_values(&records, target_column),
    );
    if examples.is_empty() {
        return Err(format!("No usable example pairs in {}", path.display()).into());
    }
    Ok(examples)
}

/// Write records to `output`, or to stdout when no path is given.
pub fn write_records(
    records: &[Record],
    output: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
            format!("Cannot create {}: {}", path.display(), e)
        })?)),
        None => Box::new(io::stdout().lock()),
    };
    match format {
        OutputFormat::Csv => write_delimited(records, writer, b',')?,
        OutputFormat::Tsv => write_delimited(records, writer, b'\t')?,
        OutputFormat::Json => write_json(records, writer)?,
    }
    Ok(())
}
