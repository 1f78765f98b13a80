//! `pwa-report config` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use pwa_report_core::config::ReportConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const SECTIONS: [&str; 5] = ["general", "analysis", "store", "analytics", "probes"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load and validate the file strictly; a missing file is reported as invalid.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match ReportConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Show the effective configuration (file + env overrides + defaults).
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = load_config(config_path).await?;
    let report = ConfigReport::build(&config, config_path, section.as_deref())?;
    writer.render(&report)?;
    Ok(())
}

#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.valid {
            writeln!(w, "{} {}", "VALID".green().bold(), self.source)?;
        } else {
            writeln!(w, "{} {}", "INVALID".red().bold(), self.source)?;
            for error in &self.errors {
                writeln!(w, "  - {}", error)?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    pub section: Option<String>,
    pub config: serde_json::Value,
    #[serde(skip)]
    pub config_toml: String,
}

impl ConfigReport {
    pub fn build(
        config: &ReportConfig,
        config_path: &Path,
        section: Option<&str>,
    ) -> Result<Self, CliError> {
        let (config_toml, value) = match section {
            None => (to_toml(config), serde_json::to_value(config)?),
            Some("general") => (to_toml(&config.general), serde_json::to_value(&config.general)?),
            Some("analysis") => (
                to_toml(&config.analysis),
                serde_json::to_value(&config.analysis)?,
            ),
            Some("store") => (to_toml(&config.store), serde_json::to_value(&config.store)?),
            Some("analytics") => (
                to_toml(&config.analytics),
                serde_json::to_value(&config.analytics)?,
            ),
            Some("probes") => (to_toml(&config.probes), serde_json::to_value(&config.probes)?),
            Some(other) => {
                return Err(CliError::Command(format!(
                    "unknown section: {} (expected: {})",
                    other,
                    SECTIONS.join(", ")
                )));
            }
        };

        Ok(Self {
            source: config_path.display().to_string(),
            section: section.map(str::to_owned),
            config: value,
            config_toml,
        })
    }
}

fn to_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {})", e))
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match &self.section {
            Some(section) => writeln!(w, "# {} [{}]", self.source, section)?,
            None => writeln!(w, "# {}", self.source)?,
        }
        write!(w, "{}", self.config_toml)
    }
}
