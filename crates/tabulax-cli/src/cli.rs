//! CLI argument definitions using clap.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::logging::LogFormat;

/// TabulaX: learn value transformations from examples and join tables
#[derive(Parser)]
#[command(name = "tabulax")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, default_value = "compact")]
    pub log_format: LogFormat,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Oracle provider (gemini, anthropic, openai, ollama, mock)
    #[arg(long, global = true, env = "TABULAX_PROVIDER", default_value = "gemini")]
    pub provider: String,

    /// Model to use (provider-specific, e.g., "gemini-1.5-flash", "llama3.2")
    #[arg(long, global = true, env = "TABULAX_MODEL")]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify examples, synthesize a rule, and save it
    Learn {
        /// Table holding the example pairs (CSV/TSV/JSON)
        #[arg(value_name = "EXAMPLES")]
        examples: PathBuf,

        /// Column with source values
        #[arg(short, long)]
        source_column: String,

        /// Column with target values
        #[arg(short, long)]
        target_column: String,

        /// Where to save the learned transformation (default: <examples>.rule.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a saved transformation to a column
    Apply {
        /// Table to transform (CSV/TSV/JSON)
        #[arg(value_name = "TABLE")]
        table: PathBuf,

        /// Learned transformation file
        #[arg(short, long)]
        rule: PathBuf,

        /// Column to transform
        #[arg(short, long)]
        column: String,

        /// Name of the output column (default: transformed_<column>)
        #[arg(long)]
        output_column: Option<String>,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (default: from the output extension, else csv)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Fuzzy left join of two tables
    Join {
        /// Left table; every row appears in the output
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Right table
        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// Key column in the source table
        #[arg(short, long)]
        source_column: String,

        /// Key column in the target table
        #[arg(short, long)]
        target_column: String,

        /// Category that selects the distance metric
        #[arg(long, default_value = "String-based")]
        category: String,

        /// Largest distance that still counts as a match
        #[arg(short, long)]
        max_distance: Option<f64>,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (default: from the output extension, else csv)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Print the transformation category of example pairs
    Classify {
        /// Table holding the example pairs (CSV/TSV/JSON)
        #[arg(value_name = "EXAMPLES")]
        examples: PathBuf,

        /// Column with source values
        #[arg(short, long)]
        source_column: String,

        /// Column with target values
        #[arg(short, long)]
        target_column: String,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    /// Pick the explicit format, else infer it from the output extension.
    pub fn resolve(explicit: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
        explicit
            .or_else(|| {
                output
                    .and_then(|p| p.extension())
                    .and_then(|e| e.to_str())
                    .and_then(|e| e.parse().ok())
            })
            .unwrap_or_default()
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" | "txt" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv, tsv, or json.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Tsv => write!(f, "tsv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_output_format_resolution() {
        assert_eq!(
            OutputFormat::resolve(None, Some(Path::new("out.json"))),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::resolve(Some(OutputFormat::Tsv), Some(Path::new("out.json"))),
            OutputFormat::Tsv
        );
        assert_eq!(OutputFormat::resolve(None, None), OutputFormat::Csv);
    }

    #[test]
    fn test_parse_join_args() {
        let cli = Cli::try_parse_from([
            "tabulax",
            "-vv",
            "--provider",
            "mock",
            "join",
            "a.csv",
            "b.csv",
            "-s",
            "name",
            "-t",
            "full_name",
            "--max-distance",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.provider, "mock");
        match cli.command {
            Commands::Join { max_distance, category, .. } => {
                assert_eq!(max_distance, Some(1.0));
                assert_eq!(category, "String-based");
            }
            _ => panic!("expected join"),
        }
    }
}
