//! `pwa-report analyze` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use pwa_report_core::AnalysisKind;
use pwa_report_core::config::ReportConfig;
use pwa_report_engine::report::icon_sources;
use pwa_report_engine::{
    AnalysisRun, AppCard, IndicatorCounts, PageDot, ScoreColor, TodoItem, TodoStatus, Verdict,
    decide_color, decide_verdict, verdict_message,
};
use pwa_report_probes::normalize_site_url;

use crate::cli::AnalyzeArgs;
use crate::commands::build_session;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `analyze` command.
///
/// Runs one full analysis (optionally followed by a clean retest), renders the
/// report, and fails with [`CliError::NotPackageable`] when the site cannot be
/// packaged yet.
pub async fn execute(
    args: AnalyzeArgs,
    config: &ReportConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let url = normalize_site_url(&args.url)?;
    info!(url = %url, retest = args.retest, "analyzing site");

    let mut session = build_session(config)?;
    let mut run = session.analyze(url.as_str()).await?;
    if args.retest {
        run = session.retest(false).await?;
    }
    let page = session.set_page(args.page);

    let report = AnalyzeReport {
        card: AppCard::from_manifest(run.manifest.as_ref(), &run.url, run.created_manifest),
        icons: icon_sources(run.manifest.as_ref()),
        created_manifest: run.created_manifest,
        categories: CategoryReport::all(&run),
        todos: session.current_page().iter().map(TodoLine::from).collect(),
        page,
        dots: session.dots(),
        indicators: session.indicators(),
        packageable: run.packageable(),
        last_tested: session.last_tested_label().await?,
    };

    writer.render(&report)?;

    match report.packageable {
        Some(true) => Ok(()),
        _ => Err(CliError::NotPackageable(format!(
            "{} required fix(es) outstanding",
            report.indicators.red
        ))),
    }
}

/// Full analysis report.
#[derive(Serialize)]
pub struct AnalyzeReport {
    pub card: AppCard,
    pub icons: Vec<String>,
    pub created_manifest: bool,
    pub categories: Vec<CategoryReport>,
    /// Todo items on the selected page.
    pub todos: Vec<TodoLine>,
    pub page: usize,
    pub dots: Vec<PageDot>,
    pub indicators: IndicatorCounts,
    pub packageable: Option<bool>,
    pub last_tested: Option<String>,
}

/// Score summary for one category.
#[derive(Serialize)]
pub struct CategoryReport {
    pub kind: AnalysisKind,
    pub valid: usize,
    pub total: usize,
    pub required_failures: usize,
    pub color: ScoreColor,
    pub verdict: Verdict,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategoryReport {
    fn all(run: &AnalysisRun) -> Vec<Self> {
        AnalysisKind::ALL
            .iter()
            .map(|&kind| {
                let score = run.score(kind);
                let verdict = decide_verdict(kind, score, run.created_manifest);
                Self {
                    kind,
                    valid: score.tally.valid_count,
                    total: score.tally.total_count,
                    required_failures: score.tally.required_failure_count,
                    color: decide_color(score),
                    verdict,
                    message: verdict_message(kind, verdict).to_owned(),
                    error: score.error.clone(),
                }
            })
            .collect()
    }
}

/// A todo item as printed.
#[derive(Serialize)]
pub struct TodoLine {
    pub card: String,
    pub field: String,
    pub status: TodoStatus,
    pub fix: String,
}

impl From<&TodoItem> for TodoLine {
    fn from(item: &TodoItem) -> Self {
        Self {
            card: item.card.clone(),
            field: item.field.clone(),
            status: item.status,
            fix: item.fix_text(),
        }
    }
}

fn kind_title(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Manifest => "Manifest",
        AnalysisKind::ServiceWorker => "Service Worker",
        AnalysisKind::Security => "Security",
    }
}

impl Render for AnalyzeReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", self.card.site_name.bold())?;
        writeln!(w, "  {}", self.card.site_url)?;
        writeln!(w, "  {}", self.card.description)?;
        if let Some(color) = &self.card.background_color {
            writeln!(w, "  Theme color: {}", color)?;
        }
        if self.created_manifest {
            writeln!(w, "  {}", "No manifest found".yellow())?;
        }
        if let Some(label) = &self.last_tested {
            writeln!(w, "  {}", label.dimmed())?;
        }
        writeln!(w)?;

        for category in &self.categories {
            let score = format!("{}/{}", category.valid, category.total);
            let score = match category.color {
                ScoreColor::Red => score.red(),
                ScoreColor::Yellow => score.yellow(),
                ScoreColor::Green => score.green(),
            };
            writeln!(w, "{:<16} {}", kind_title(category.kind).bold(), score)?;
            if let Some(error) = &category.error {
                writeln!(w, "  {} {}", "error:".red(), error)?;
            }
            writeln!(w, "  {}", category.message)?;
        }
        writeln!(w)?;

        writeln!(
            w,
            "Action items: {} required, {} other",
            self.indicators.red.to_string().red(),
            self.indicators.other
        )?;
        if self.todos.is_empty() {
            writeln!(w, "  (none)")?;
        }
        for todo in &self.todos {
            let marker = match todo.status {
                TodoStatus::Red => "!".red().bold(),
                TodoStatus::Yellow => "~".yellow(),
                TodoStatus::Retest => "*".cyan(),
            };
            writeln!(w, "  {} {}", marker, todo.fix)?;
        }
        if self.dots.len() > 1 {
            let dots: String = self
                .dots
                .iter()
                .map(|dot| if dot.active { '●' } else { '○' })
                .collect();
            writeln!(w, "  Page {} of {}  {}", self.page, self.dots.len(), dots)?;
        }
        writeln!(w)?;

        match self.packageable {
            Some(true) => writeln!(w, "{}", "READY TO PACKAGE".green().bold())?,
            _ => writeln!(w, "{}", "NOT READY TO PACKAGE".red().bold())?,
        }

        if !self.icons.is_empty() && !self.created_manifest {
            writeln!(w, "Icons:")?;
            for icon in &self.icons {
                writeln!(w, "  {}", icon)?;
            }
        }
        Ok(())
    }
}
