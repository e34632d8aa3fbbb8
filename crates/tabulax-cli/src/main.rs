//! TabulaX CLI - learn, apply and join from the command line.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use logging::{LogConfig, init_logging};

fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose)
        .with_format(cli.log_format)
        .with_log_file(cli.log_file.clone());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Error: cannot open log file: {}", e);
        std::process::exit(1);
    }

    let oracle = commands::OracleChoice {
        provider: cli.provider,
        model: cli.model,
    };

    let result = match cli.command {
        Commands::Learn {
            examples,
            source_column,
            target_column,
            output,
        } => commands::learn::run(examples, source_column, target_column, output, &oracle),

        Commands::Apply {
            table,
            rule,
            column,
            output_column,
            output,
            format,
        } => commands::apply::run(table, rule, column, output_column, output, format, &oracle),

        Commands::Join {
            source,
            target,
            source_column,
            target_column,
            category,
            max_distance,
            output,
            format,
        } => commands::join::run(
            source,
            target,
            source_column,
            target_column,
            category,
            max_distance,
            output,
            format,
        ),

        Commands::Classify {
            examples,
            source_column,
            target_column,
        } => commands::classify::run(examples, source_column, target_column, &oracle),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
