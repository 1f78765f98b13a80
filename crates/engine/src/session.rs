//! Report session -- the stateful surface a front end drives.
//!
//! A [`ReportSession`] ties one orchestrator to the pager, the retest
//! controller, analytics, and the `last_tested` stamp. Todo clicks resolve to
//! a [`TodoAction`] keyed by the item's card and field rather than by any
//! rendering surface.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use pwa_report_core::analytics::record_checkpoint;
use pwa_report_core::config::AnalysisConfig;
use pwa_report_core::metrics as m;
use pwa_report_core::{AnalyticsSink, StateStore, store};

use crate::error::EngineError;
use crate::orchestrator::{AnalysisRun, Orchestrator};
use crate::pager::{IndicatorCounts, PageDot, TodoPager, indicator_counts, sorted_todos};
use crate::report::last_tested_label;
use crate::retest::{RetestController, RetestState};
use crate::todo::{RETEST_CARD, SW_MODAL_FIELD, TodoItem, retest_todo};

/// What the front end should do after a todo item is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoAction {
    /// Show the retest confirmation for `thing_to_add`.
    ConfirmRetest { thing_to_add: String },
    /// Expand the service-worker card and open the service-worker selector.
    OpenServiceWorkerSelector { card: String },
    /// Expand `card` and highlight the check keyed by `field`.
    Focus {
        card: String,
        field: String,
        display_string: Option<String>,
    },
}

pub struct ReportSession {
    orchestrator: Arc<Orchestrator>,
    analytics: Arc<dyn AnalyticsSink>,
    session_id: Uuid,
    pager: TodoPager,
    retest: RetestController,
    retest_delay: Duration,
    site_url: Option<String>,
}

impl ReportSession {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        analytics: Arc<dyn AnalyticsSink>,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            orchestrator,
            analytics,
            session_id: Uuid::new_v4(),
            pager: TodoPager::new(config.page_size),
            retest: RetestController::new(),
            retest_delay: config.retest_delay(),
            site_url: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn site_url(&self) -> Option<&str> {
        self.site_url.as_deref()
    }

    pub fn snapshot(&self) -> AnalysisRun {
        self.orchestrator.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisRun> {
        self.orchestrator.subscribe()
    }

    pub fn retest_state(&self) -> &RetestState {
        self.retest.state()
    }

    pub fn confirmation_visible(&self) -> bool {
        self.retest.confirmation_visible()
    }

    async fn stamp_last_tested(&self) {
        let store: &dyn StateStore = self.orchestrator.store().as_ref();
        if let Err(e) = store::stamp_last_tested(store, Utc::now()).await {
            tracing::warn!(error = %e, "failed to record last tested time");
        }
    }

    /// First analysis of `url`.
    pub async fn analyze(&mut self, url: &str) -> Result<AnalysisRun, EngineError> {
        self.site_url = Some(url.to_owned());
        self.pager.reset();
        let run = self.orchestrator.run_all_tests(url).await?;
        self.stamp_last_tested().await;
        Ok(run)
    }

    /// Resets and reruns the analysis of the current site.
    ///
    /// With `from_confirmation`, a pending confirmation is consumed and the
    /// configured delay elapses before the confirmation closes and the reset
    /// begins.
    pub async fn retest(&mut self, from_confirmation: bool) -> Result<AnalysisRun, EngineError> {
        let url = self.site_url.clone().ok_or(EngineError::NoSite)?;
        record_checkpoint(self.analytics.as_ref(), self.session_id, "retest_clicked");

        if from_confirmation {
            let thing_to_add = self.retest.confirm()?;
            tracing::info!(thing_to_add = %thing_to_add, "retest confirmed");
            tokio::time::sleep(self.retest_delay).await;
        }

        self.retest.begin_reset()?;
        self.orchestrator.reset();
        self.pager.reset();
        self.retest.begin_run()?;
        counter!(m::RETESTS_TOTAL).increment(1);

        match self.orchestrator.run_all_tests(&url).await {
            Ok(run) => {
                self.retest.finish()?;
                self.stamp_last_tested().await;
                Ok(run)
            }
            Err(e) => {
                self.retest.abort();
                Err(e)
            }
        }
    }

    /// Closes the retest confirmation without rerunning.
    pub fn decline_retest(&mut self) {
        self.retest.decline();
    }

    pub fn todo_clicked(&mut self, item: &TodoItem) -> Result<TodoAction, EngineError> {
        record_checkpoint(self.analytics.as_ref(), self.session_id, "todo_item_clicked");

        if item.card == RETEST_CARD {
            let thing_to_add = item.display_string.clone().unwrap_or_default();
            self.retest.request_confirmation(thing_to_add.clone())?;
            return Ok(TodoAction::ConfirmRetest { thing_to_add });
        }

        if item.field == SW_MODAL_FIELD {
            record_checkpoint(self.analytics.as_ref(), self.session_id, "sw_selector_opened");
            return Ok(TodoAction::OpenServiceWorkerSelector {
                card: item.card.clone(),
            });
        }

        Ok(TodoAction::Focus {
            card: item.card.clone(),
            field: item.field.clone(),
            display_string: item.display_string.clone(),
        })
    }

    /// Adds a "deploy this and retest" reminder to the current run.
    pub fn add_retest_todo(&self, thing_to_add: &str) {
        self.orchestrator.push_todo(retest_todo(thing_to_add));
    }

    pub fn sorted_todos(&self) -> Vec<TodoItem> {
        sorted_todos(&self.orchestrator.snapshot().todos)
    }

    pub fn page(&self) -> usize {
        self.pager.page()
    }

    /// Items on the current page, in canonical order.
    pub fn current_page(&self) -> Vec<TodoItem> {
        let sorted = self.sorted_todos();
        self.pager.paginate(&sorted).to_vec()
    }

    pub fn switch_page(&mut self, forward: bool) -> usize {
        let total = self.orchestrator.snapshot().todos.len();
        self.pager.switch_page(forward, total)
    }

    pub fn set_page(&mut self, page: usize) -> usize {
        let total = self.orchestrator.snapshot().todos.len();
        self.pager.set_page(page, total)
    }

    pub fn dots(&self) -> Vec<PageDot> {
        self.pager.dots(self.orchestrator.snapshot().todos.len())
    }

    pub fn indicators(&self) -> IndicatorCounts {
        indicator_counts(&self.orchestrator.snapshot().todos)
    }

    /// `None` when no run has been stamped yet.
    pub async fn last_tested_label(&self) -> Result<Option<String>, EngineError> {
        let store: &dyn StateStore = self.orchestrator.store().as_ref();
        let last = store::last_tested(store).await?;
        Ok(last.map(|last| last_tested_label(last, Utc::now())))
    }
}

/// Recomputes the "Last tested ..." label every `interval` until `shutdown`.
pub fn watch_last_tested(
    store: Arc<dyn StateStore>,
    interval: Duration,
    shutdown: CancellationToken,
) -> watch::Receiver<Option<String>> {
    let (tx, rx) = watch::channel(None);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let label = match store::last_tested(store.as_ref()).await {
                Ok(last) => last.map(|last| last_tested_label(last, Utc::now())),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read last tested time");
                    continue;
                }
            };
            if tx.send(label).is_err() {
                break;
            }
        }
    });
    rx
}
