//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// pwa-report -- check whether a site is ready to be packaged as a PWA.
///
/// Use `pwa-report <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "pwa-report", version, about, long_about = None)]
pub struct Cli {
    /// Path to the pwa-report.toml configuration file.
    #[arg(short, long, default_value = "pwa-report.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a site's manifest, service worker, and security.
    Analyze(AnalyzeArgs),

    /// Show when the site was last tested and what was stored.
    History(HistoryArgs),

    /// Manage configuration.
    Config(ConfigArgs),

    /// Start the dev server of a PWA starter project.
    Start(StartArgs),
}

// ---- analyze ----

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Site URL; `https://` is assumed when no scheme is given.
    pub url: String,

    /// Todo page to show (1-based).
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Run the analysis a second time from a clean state.
    #[arg(long)]
    pub retest: bool,
}

// ---- history ----

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Keep refreshing the "last tested" label until interrupted.
    #[arg(short, long)]
    pub follow: bool,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, analysis, store, analytics, probes).
        #[arg(long)]
        section: Option<String>,
    },
}

// ---- start ----

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Arguments passed through to the dev task, as one string.
    #[arg(allow_hyphen_values = true)]
    pub vite_args: Option<String>,
}
