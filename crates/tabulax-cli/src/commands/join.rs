//! Join command - fuzzy left join of two tables.

use std::path::PathBuf;

use colored::Colorize;
use tabulax::{FuzzyJoinEngine, TabulaxConfig, TransformationCategory};

use super::{load_records, write_records};
use crate::cli::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub fn run(
    source: PathBuf,
    target: PathBuf,
    source_column: String,
    target_column: String,
    category: String,
    max_distance: Option<f64>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    let category: TransformationCategory = category.parse()?;
    let max_distance = max_distance.unwrap_or(TabulaxConfig::default().max_distance);

    let source_records = load_records(&source)?;
    let target_records = load_records(&target)?;

    // The join needs no oracle
    let engine = FuzzyJoinEngine::new(category);
    let joined = engine.join(
        &source_records,
        &target_records,
        &source_column,
        &target_column,
        max_distance,
    )?;

    let format = OutputFormat::resolve(format, output.as_deref());
    write_records(&joined.flatten(), output.as_ref(), format)?;

    eprintln!(
        "{} {} of {} rows within distance {} ({:?})",
        "Matched".cyan().bold(),
        joined.matched_count().to_string().white().bold(),
        joined.records.len(),
        max_distance,
        engine.metric()
    );
    if category == TransformationCategory::General {
        eprintln!(
            "{} General values have no distance metric; nothing can match.",
            "Note:".yellow()
        );
    }
    if let Some(path) = &output {
        eprintln!("{} {}", "Saved".green().bold(), path.display().to_string().cyan());
    }

    Ok(())
}
