//! `pwa-report start` command handler

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use pwa_report_core::config::ReportConfig;
use pwa_report_core::{AnalyticsBehavior, AnalyticsEvent, AnalyticsSink};

use crate::cli::StartArgs;
use crate::commands::build_analytics;
use crate::error::CliError;

/// npm scripts a PWA starter template defines.
const DEV_SERVER_SCRIPT: &str = "dev-server";
const DEV_TASK_SCRIPT: &str = "dev-task";

/// Execute the `start` command in `project_dir`.
///
/// Runs the template's dev server through npm, then records a `start` event
/// whether or not the directory was a template.
pub async fn execute(
    args: StartArgs,
    config: &ReportConfig,
    project_dir: &Path,
) -> Result<(), CliError> {
    let started = Instant::now();
    let options = args.vite_args.clone().unwrap_or_default();

    let result = if is_template_directory(project_dir).await {
        run_dev_server(project_dir, args.vite_args.as_deref())
    } else {
        Err(CliError::Command(format!(
            "{} is not a PWA starter project (package.json needs `{}` and `{}` scripts)",
            project_dir.display(),
            DEV_SERVER_SCRIPT,
            DEV_TASK_SCRIPT
        )))
    };

    let elapsed_ms = started.elapsed().as_millis();
    let event = AnalyticsEvent::new("start", AnalyticsBehavior::Command, Uuid::new_v4())
        .with_property("timeMS", elapsed_ms.to_string())
        .with_property("options", options);
    if let Err(e) = build_analytics(config).record(event) {
        warn!(error = %e, "analytics event dropped");
    }

    result
}

/// A directory whose `package.json` defines both dev scripts.
pub async fn is_template_directory(dir: &Path) -> bool {
    let Ok(raw) = tokio::fs::read_to_string(dir.join("package.json")).await else {
        return false;
    };
    let Ok(package) = serde_json::from_str::<serde_json::Value>(&raw) else {
        return false;
    };
    let scripts = &package["scripts"];
    scripts.get(DEV_SERVER_SCRIPT).is_some() && scripts.get(DEV_TASK_SCRIPT).is_some()
}

/// Arguments for `npm`.
pub fn npm_args(vite_args: Option<&str>) -> Vec<String> {
    match vite_args.map(str::trim).filter(|a| !a.is_empty()) {
        Some(extra) => ["run", DEV_TASK_SCRIPT, "--"]
            .into_iter()
            .map(str::to_owned)
            .chain(extra.split_whitespace().map(str::to_owned))
            .collect(),
        None => vec!["run".to_owned(), DEV_SERVER_SCRIPT.to_owned()],
    }
}

fn run_dev_server(project_dir: &Path, vite_args: Option<&str>) -> Result<(), CliError> {
    let args = npm_args(vite_args);
    info!(args = ?args, dir = %project_dir.display(), "starting dev server");

    let status = Command::new("npm")
        .args(&args)
        .current_dir(project_dir)
        .status()
        .map_err(|e| CliError::Command(format!("failed to run npm: {}", e)))?;

    if !status.success() {
        return Err(CliError::Command(format!("npm exited with status: {}", status)));
    }
    Ok(())
}
