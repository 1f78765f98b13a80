//! Test orchestration -- concurrent suite execution and run-state reduction.
//!
//! The [`Orchestrator`] resolves a manifest for the target URL, runs the three
//! category suites concurrently on a [`JoinSet`], and folds each branch's
//! immutable [`CategoryOutcome`] into the shared [`AnalysisRun`] as soon as it
//! settles. Observers subscribe to a [`watch`] channel and see partial
//! progress; every published value is internally consistent.
//!
//! # Run fencing
//!
//! Each run takes a monotonic id. Starting a new run (or resetting) cancels the
//! previous run's token and replaces the published state in one step, so any
//! outcome still carrying the old id is discarded.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use pwa_report_core::metrics as m;
use pwa_report_core::{
    AnalysisKind, DynSuite, ManifestContext, ManifestResolver, MissingField, StateStore,
    SuiteError, SuiteResults, SuiteTarget, Validation,
};

use crate::error::EngineError;
use crate::score::{CategoryScore, aggregate_checks, aggregate_manifest};
use crate::todo::{TodoItem, build_todos};

/// Lifecycle of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Running,
    PartiallyComplete,
    Complete,
}

/// Observable state of one end-to-end test pass.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    pub run_id: u64,
    pub url: String,
    pub phase: RunPhase,
    /// No manifest was found; one was synthesized.
    pub created_manifest: bool,
    pub manifest: Option<ManifestContext>,
    /// Indexed by [`AnalysisKind::index`].
    pub scores: [CategoryScore; 3],
    pub todos: Vec<TodoItem>,
    pub missing_fields: Vec<MissingField>,
    /// `None` until the category settles.
    pub can_package_list: [Option<bool>; 3],
    /// Only meaningful once `phase == Complete`.
    pub can_package: bool,
}

impl AnalysisRun {
    /// Fully reset state: zero counters, empty lists, every category loading.
    pub fn new(run_id: u64, url: impl Into<String>) -> Self {
        Self {
            run_id,
            url: url.into(),
            phase: RunPhase::Idle,
            created_manifest: false,
            manifest: None,
            scores: Default::default(),
            todos: Vec::new(),
            missing_fields: Vec::new(),
            can_package_list: [None; 3],
            can_package: false,
        }
    }

    pub fn score(&self, kind: AnalysisKind) -> &CategoryScore {
        &self.scores[kind.index()]
    }

    pub fn is_complete(&self) -> bool {
        self.phase == RunPhase::Complete
    }

    /// `can_package` when it is authoritative, otherwise `None`.
    pub fn packageable(&self) -> Option<bool> {
        self.is_complete().then_some(self.can_package)
    }

    /// Folds one settled category into the run.
    pub fn apply(&mut self, outcome: &CategoryOutcome) {
        let index = outcome.kind.index();

        match &outcome.result {
            Ok(results) => {
                let tally = match results {
                    SuiteResults::Manifest {
                        validations,
                        missing,
                    } => {
                        self.missing_fields.extend(missing.iter().cloned());
                        aggregate_manifest(validations, missing)
                    }
                    SuiteResults::Checks(checks) => aggregate_checks(checks),
                };
                self.scores[index] = CategoryScore::loaded(tally);
                self.todos.extend(build_todos(outcome.kind, results));
            }
            Err(e) => {
                self.scores[index] = CategoryScore::failed(e.to_string());
            }
        }
        self.can_package_list[index] = Some(self.scores[index].passes());

        if self.can_package_list.iter().all(Option::is_some) {
            self.can_package = self.can_package_list.iter().all(|slot| *slot == Some(true));
            self.phase = RunPhase::Complete;
        } else {
            self.phase = RunPhase::PartiallyComplete;
        }
    }
}

/// Immutable result of one suite branch.
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub kind: AnalysisKind,
    pub result: Result<SuiteResults, SuiteError>,
    pub elapsed: Duration,
}

/// Valid results first, then by member name.
fn order_validations(validations: &mut [Validation]) {
    validations.sort_by(|a, b| b.valid.cmp(&a.valid).then_with(|| a.member.cmp(&b.member)));
}

/// Builder for [`Orchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    resolver: Option<Arc<dyn ManifestResolver>>,
    suites: Vec<Arc<dyn DynSuite>>,
    store: Option<Arc<dyn StateStore>>,
}

impl OrchestratorBuilder {
    pub fn resolver(mut self, resolver: Arc<dyn ManifestResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn suite(mut self, suite: Arc<dyn DynSuite>) -> Self {
        self.suites.push(suite);
        self
    }

    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Requires a resolver, a store, and exactly one suite per [`AnalysisKind`].
    pub fn build(self) -> Result<Orchestrator, EngineError> {
        let resolver = self
            .resolver
            .ok_or(EngineError::MissingDependency("manifest resolver"))?;
        let store = self
            .store
            .ok_or(EngineError::MissingDependency("state store"))?;

        let mut slots: [Option<Arc<dyn DynSuite>>; 3] = [None, None, None];
        for suite in self.suites {
            let kind = suite.kind();
            let slot = &mut slots[kind.index()];
            if slot.is_some() {
                return Err(EngineError::DuplicateSuite(kind));
            }
            *slot = Some(suite);
        }

        let mut suites = Vec::with_capacity(slots.len());
        for (kind, slot) in AnalysisKind::ALL.into_iter().zip(slots) {
            suites.push(slot.ok_or(EngineError::MissingSuite(kind))?);
        }

        let (state_tx, _) = watch::channel(AnalysisRun::new(0, String::new()));

        Ok(Orchestrator {
            resolver,
            suites,
            store,
            next_run_id: AtomicU64::new(0),
            current: Mutex::new(CancellationToken::new()),
            state_tx,
        })
    }
}

/// Runs the three category suites for a URL and publishes run state.
pub struct Orchestrator {
    resolver: Arc<dyn ManifestResolver>,
    /// Ordered by [`AnalysisKind::index`].
    suites: Vec<Arc<dyn DynSuite>>,
    store: Arc<dyn StateStore>,
    next_run_id: AtomicU64,
    /// Token of the run currently allowed to publish.
    current: Mutex<CancellationToken>,
    state_tx: watch::Sender<AnalysisRun>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Receiver that observes every published run state.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisRun> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> AnalysisRun {
        self.state_tx.borrow().clone()
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Cancels the in-flight run, installs a fresh token and publishes the
    /// state built by `start`. Id allocation, token swap and publication
    /// happen under one lock, so the last fenced run is always the published one.
    fn fence(&self, start: impl FnOnce(u64) -> AnalysisRun) -> (u64, CancellationToken) {
        let token = CancellationToken::new();
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let run_id = self.next_run_id.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = std::mem::replace(&mut *current, token.clone());
        let state = start(run_id);
        self.state_tx.send_replace(state);
        drop(current);

        previous.cancel();
        (run_id, token)
    }

    /// Zeroes every counter, clears every list and marks every category loading,
    /// published as a single replacement. Any in-flight run is superseded.
    pub fn reset(&self) -> u64 {
        let (run_id, _token) = self.fence(|run_id| {
            let url = self.state_tx.borrow().url.clone();
            AnalysisRun::new(run_id, url)
        });
        tracing::debug!(run_id, "analysis state reset");
        run_id
    }

    /// Appends an item to the current run's todo list.
    pub fn push_todo(&self, item: TodoItem) {
        self.state_tx.send_modify(|run| run.todos.push(item));
    }

    /// Applies `f` only if `run_id` is still the published run.
    fn update_if_current(&self, run_id: u64, f: impl FnOnce(&mut AnalysisRun)) -> bool {
        self.state_tx.send_if_modified(|run| {
            if run.run_id != run_id {
                return false;
            }
            f(run);
            true
        })
    }

    async fn resolve(&self, url: &str) -> (ManifestContext, bool) {
        match self.resolver.fetch_or_create(url).await {
            Ok(Some(context)) => (context, false),
            Ok(None) => {
                tracing::info!(url, "no manifest found, synthesizing one");
                (self.resolver.create_from_empty(url), true)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "manifest resolution failed, synthesizing one");
                (self.resolver.create_from_empty(url), true)
            }
        }
    }

    async fn persist(&self, outcome: &CategoryOutcome) {
        let Ok(results) = &outcome.result else {
            return;
        };
        let key = outcome.kind.store_key();
        let value = match results.to_store_value() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize suite results");
                return;
            }
        };
        if let Err(e) = self.store.set(key, value).await {
            tracing::warn!(key, error = %e, "failed to persist suite results");
        }
    }

    fn superseded(&self, run_id: u64) -> EngineError {
        counter!(m::ANALYSIS_STALE_OUTCOMES_TOTAL).increment(1);
        tracing::debug!(run_id, "analysis run superseded");
        EngineError::Superseded { run_id }
    }

    /// Runs all three suites for `url` and returns the completed run.
    ///
    /// Suite failures degrade their own category; they never abort the others.
    /// Returns [`EngineError::Superseded`] when a newer run or a reset replaced
    /// this one before it finished.
    pub async fn run_all_tests(&self, url: &str) -> Result<AnalysisRun, EngineError> {
        let (run_id, token) = self.fence(|run_id| {
            let mut fresh = AnalysisRun::new(run_id, url);
            fresh.phase = RunPhase::Running;
            fresh
        });
        let started = Instant::now();
        counter!(m::ANALYSIS_RUNS_TOTAL).increment(1);
        tracing::info!(run_id, url, "analysis run started");

        let (context, created_manifest) = tokio::select! {
            () = token.cancelled() => return Err(self.superseded(run_id)),
            resolved = self.resolve(url) => resolved,
        };

        if !self.update_if_current(run_id, |run| {
            run.created_manifest = created_manifest;
            run.manifest = Some(context.clone());
        }) {
            return Err(self.superseded(run_id));
        }

        let target = Arc::new(SuiteTarget {
            url: url.to_owned(),
            manifest: context,
            created_manifest,
        });

        let mut set = JoinSet::new();
        let mut kinds = HashMap::with_capacity(self.suites.len());
        for suite in &self.suites {
            let suite = Arc::clone(suite);
            let target = Arc::clone(&target);
            let kind = suite.kind();
            let handle = set.spawn(async move {
                let start = Instant::now();
                let mut result = suite.evaluate(&target).await;
                if let Ok(SuiteResults::Manifest { validations, .. }) = &mut result {
                    order_validations(validations);
                }
                CategoryOutcome {
                    kind,
                    result,
                    elapsed: start.elapsed(),
                }
            });
            kinds.insert(handle.id(), kind);
        }

        loop {
            let joined = tokio::select! {
                () = token.cancelled() => None,
                joined = set.join_next_with_id() => Some(joined),
            };
            let Some(joined) = joined else {
                set.abort_all();
                return Err(self.superseded(run_id));
            };
            let Some(joined) = joined else {
                break;
            };

            let outcome = match joined {
                Ok((_, outcome)) => outcome,
                Err(join_err) => {
                    let Some(kind) = kinds.get(&join_err.id()).copied() else {
                        tracing::error!(error = %join_err, "suite task with unknown id failed");
                        continue;
                    };
                    let error = if join_err.is_panic() {
                        SuiteError::Panicked(join_err.to_string())
                    } else {
                        SuiteError::Cancelled
                    };
                    CategoryOutcome {
                        kind,
                        result: Err(error),
                        elapsed: Duration::ZERO,
                    }
                }
            };

            let label = outcome.kind.to_string();
            histogram!(m::SUITE_DURATION_SECONDS, m::LABEL_CATEGORY => label.clone())
                .record(outcome.elapsed.as_secs_f64());
            if let Err(e) = &outcome.result {
                counter!(m::SUITE_FAILURES_TOTAL, m::LABEL_CATEGORY => label).increment(1);
                tracing::warn!(run_id, category = %outcome.kind, error = %e, "suite failed");
            } else {
                tracing::debug!(
                    run_id,
                    category = %outcome.kind,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "suite settled"
                );
            }

            if !self.update_if_current(run_id, |run| run.apply(&outcome)) {
                set.abort_all();
                return Err(self.superseded(run_id));
            }
            self.persist(&outcome).await;
        }

        let run = self.snapshot();
        if run.run_id != run_id {
            return Err(self.superseded(run_id));
        }

        histogram!(m::ANALYSIS_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        gauge!(m::TODO_ITEMS).set(run.todos.len() as f64);
        tracing::info!(
            run_id,
            url,
            can_package = run.can_package,
            todos = run.todos.len(),
            "analysis run complete"
        );
        Ok(run)
    }
}
