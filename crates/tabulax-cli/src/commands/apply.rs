//! Apply command - run a saved transformation over a column.

use std::path::PathBuf;

use colored::Colorize;
use tabulax::{ApplyOptions, LearnedTransformation};

use super::{OracleChoice, load_records, write_records};
use crate::cli::OutputFormat;

pub fn run(
    table: PathBuf,
    rule: PathBuf,
    column: String,
    output_column: Option<String>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    oracle: &OracleChoice,
) -> Result<(), Box<dyn std::error::Error>> {
    if !rule.exists() {
        return Err(format!("Rule file not found: {}", rule.display()).into());
    }
    let learned = LearnedTransformation::from_json(&std::fs::read_to_string(&rule)?)?;
    let records = load_records(&table)?;

    let mut options = ApplyOptions::new();
    if let Some(name) = output_column {
        options = options.with_output_column(name);
    }

    let tabulax = oracle.connect()?;
    let applied = tabulax.apply(&records, &column, &learned, &options)?;

    let format = OutputFormat::resolve(format, output.as_deref());
    write_records(&applied.records, output.as_ref(), format)?;

    // Keep stdout clean for piped table output
    let report = &applied.report;
    eprintln!(
        "{} {} rows, {} changed, {} failed ({})",
        "Applied".cyan().bold(),
        report.rows_processed.to_string().white().bold(),
        report.rows_changed.to_string().green(),
        report.failures.len().to_string().red(),
        learned.category
    );
    for (provenance, count) in &report.provenance_counts {
        eprintln!("  {:24} {}", provenance.as_str(), count);
    }
    for failure in report.failures.iter().take(5) {
        eprintln!(
            "  {} row {}: '{}' ({})",
            "kept".yellow(),
            failure.row,
            failure.original_value,
            failure.reason
        );
    }
    if report.failures.len() > 5 {
        eprintln!("  ... and {} more", report.failures.len() - 5);
    }
    if let Some(path) = &output {
        eprintln!("{} {}", "Saved".green().bold(), path.display().to_string().cyan());
    }

    Ok(())
}
