//! pwa-report CLI
//!
//! Analyzes a site's manifest, service worker and security setup, prints the
//! action items, and reports whether the site can be packaged.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let loaded = commands::load_config(&cli.config).await;

    // logging comes up even when the config file is broken so the error can be traced
    let general = loaded
        .as_ref()
        .map(|config| config.general.clone())
        .unwrap_or_default();
    logging::init_tracing(&general, cli.log_level.as_deref())
        .map_err(|e| CliError::Logging(e.to_string()))?;

    pwa_report_core::metrics::describe_all();
    tracing::debug!(config = %cli.config.display(), "pwa-report starting");

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
        Commands::Analyze(args) => commands::analyze::execute(args, &loaded?, &writer).await,
        Commands::History(args) => commands::history::execute(args, &loaded?, &writer).await,
        Commands::Start(args) => {
            let project_dir = std::env::current_dir()?;
            commands::start::execute(args, &loaded?, &project_dir).await
        }
    }
}
