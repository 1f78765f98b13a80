//! `pwa-report history` command handler

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use pwa_report_core::config::ReportConfig;
use pwa_report_core::error::ReportError;
use pwa_report_core::store::{self, JsonFileStore};
use pwa_report_core::{AnalysisKind, StateStore, TestResult, Validation};
use pwa_report_engine::report::last_tested_label;
use pwa_report_engine::watch_last_tested;

use crate::cli::HistoryArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `history` command.
///
/// Always reads the file store at `[store].path`: a memory store does not
/// outlive the `analyze` process that filled it.
pub async fn execute(
    args: HistoryArgs,
    config: &ReportConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config.store.path, "reading stored results");
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(&config.store.path));

    let report = HistoryReport::load(store.as_ref(), &config.store.path).await?;
    writer.render(&report)?;

    if args.follow {
        follow(store, config, writer, report.last_tested).await?;
    }
    Ok(())
}

/// Re-render the label whenever its text changes, until Ctrl-C.
async fn follow(
    store: Arc<dyn StateStore>,
    config: &ReportConfig,
    writer: &OutputWriter,
    mut shown: Option<String>,
) -> Result<(), CliError> {
    let shutdown = CancellationToken::new();
    let mut labels = watch_last_tested(
        store,
        config.analysis.last_tested_poll_interval(),
        shutdown.clone(),
    );

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                debug!("interrupted, stopping history refresh");
                break;
            }
            changed = labels.changed() => {
                if changed.is_err() {
                    break;
                }
                let label = labels.borrow_and_update().clone();
                if label != shown {
                    writer.render(&LastTestedLine { last_tested: label.clone() })?;
                    shown = label;
                }
            }
        }
    }

    shutdown.cancel();
    Ok(())
}

/// Stored result counts for one category.
#[derive(Debug, Serialize)]
pub struct StoredCounts {
    pub kind: AnalysisKind,
    pub passed: usize,
    pub total: usize,
}

/// What the last run left in the store.
#[derive(Debug, Serialize)]
pub struct HistoryReport {
    pub source: String,
    pub last_tested: Option<String>,
    /// Only categories with stored results.
    pub categories: Vec<StoredCounts>,
}

impl HistoryReport {
    pub async fn load(store: &dyn StateStore, source: &str) -> Result<Self, CliError> {
        let last_tested = store::last_tested(store)
            .await
            .map_err(ReportError::from)?
            .map(|last| last_tested_label(last, chrono::Utc::now()));

        let mut categories = Vec::new();
        for kind in AnalysisKind::ALL {
            if let Some(counts) = stored_counts(store, kind).await? {
                categories.push(counts);
            }
        }

        Ok(Self {
            source: source.to_owned(),
            last_tested,
            categories,
        })
    }
}

async fn stored_counts(
    store: &dyn StateStore,
    kind: AnalysisKind,
) -> Result<Option<StoredCounts>, CliError> {
    let counts = match kind {
        AnalysisKind::Manifest => {
            store::get_typed::<Vec<Validation>>(store, kind.store_key())
                .await
                .map_err(ReportError::from)?
                .map(|validations| (validations.iter().filter(|v| v.valid).count(), validations.len()))
        }
        AnalysisKind::ServiceWorker | AnalysisKind::Security => {
            store::get_typed::<Vec<TestResult>>(store, kind.store_key())
                .await
                .map_err(ReportError::from)?
                .map(|results| (results.iter().filter(|r| r.result).count(), results.len()))
        }
    };

    Ok(counts.map(|(passed, total)| StoredCounts {
        kind,
        passed,
        total,
    }))
}

impl Render for HistoryReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Store: {}", self.source)?;
        match &self.last_tested {
            Some(label) => writeln!(w, "{}", label.bold())?,
            None => writeln!(w, "{}", "Not tested yet".dimmed())?,
        }
        for counts in &self.categories {
            let score = format!("{}/{}", counts.passed, counts.total);
            let score = if counts.passed == counts.total {
                score.green()
            } else {
                score.yellow()
            };
            writeln!(w, "  {:<16} {}", counts.kind.to_string(), score)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct LastTestedLine {
    last_tested: Option<String>,
}

impl Render for LastTestedLine {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match &self.last_tested {
            Some(label) => writeln!(w, "{}", label),
            None => writeln!(w, "Not tested yet"),
        }
    }
}
