//! Classify command - print the transformation category only.

use std::path::PathBuf;

use colored::Colorize;

use super::{OracleChoice, load_examples};

pub fn run(
    examples: PathBuf,
    source_column: String,
    target_column: String,
    oracle: &OracleChoice,
) -> Result<(), Box<dyn std::error::Error>> {
    let example_set = load_examples(&examples, &source_column, &target_column)?;
    let tabulax = oracle.connect()?;
    let classification = tabulax.classify(&example_set);

    if classification.is_confident() {
        println!("{}", classification.category.to_string().white().bold());
    } else {
        println!(
            "{} {}",
            classification.category.to_string().white().bold(),
            format!("(fallback: {:?})", classification.method).dimmed()
        );
    }

    Ok(())
}
