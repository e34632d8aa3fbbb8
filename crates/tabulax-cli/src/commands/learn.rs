//! Learn command - classify examples, synthesize a rule, and save it.

use std::path::PathBuf;

use colored::Colorize;
use tabulax::TransformationRule;

use super::{OracleChoice, load_examples};

pub fn run(
    examples: PathBuf,
    source_column: String,
    target_column: String,
    output: Option<PathBuf>,
    oracle: &OracleChoice,
) -> Result<(), Box<dyn std::error::Error>> {
    let example_set = load_examples(&examples, &source_column, &target_column)?;

    println!(
        "{} {} example pairs from {}",
        "Learning".cyan().bold(),
        example_set.len().to_string().white().bold(),
        examples.display().to_string().white()
    );

    let tabulax = oracle.connect()?;
    let learned = tabulax.learn(&example_set)?;

    println!(
        "  {:12} {}",
        "Category:".yellow(),
        learned.category.to_string().white().bold()
    );
    match &learned.rule {
        Some(rule) => println!("  {:12} {}", "Rule:".yellow(), rule.describe()),
        None => println!("  {:12} {}", "Rule:".yellow(), "identity".dimmed()),
    }
    if let Some(TransformationRule::Generated(generated)) = &learned.rule {
        for (i, step) in generated.program.steps.iter().enumerate() {
            println!("    {}. {}", i + 1, step.name());
        }
    }
    if let Some(error) = &learned.synthesis_error {
        println!(
            "{} synthesis failed, values will pass through unchanged: {}",
            "Warning:".yellow().bold(),
            error
        );
    }

    let output_path = output.unwrap_or_else(|| {
        let stem = examples.file_stem().unwrap_or_default().to_string_lossy();
        examples.with_file_name(format!("{}.rule.json", stem))
    });
    std::fs::write(&output_path, learned.to_json()?)
        .map_err(|e| format!("Cannot write {}: {}", output_path.display(), e))?;

    println!(
        "{} {}",
        "Saved".green().bold(),
        output_path.display().to_string().cyan()
    );
    println!(
        "Run {} to use it.",
        format!(
            "tabulax apply <table> --rule {} --column <col>",
            output_path.display()
        )
        .cyan()
    );

    Ok(())
}
