//! Mock collaborators for E2E tests.
//!
//! [`MockSuite`] replays a scripted response per call (the last one repeats),
//! optionally after a per-call delay, so tests can model slow, failing,
//! panicking, and changing suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pwa_report_core::error::{AnalyticsError, ResolveError};
use pwa_report_core::{
    AnalysisKind, AnalyticsEvent, AnalyticsSink, BoxFuture, CategorySuite, ManifestContext,
    ManifestResolver, SuiteError, SuiteResults, SuiteTarget,
};

/// What a mock suite does on one call.
#[derive(Clone)]
#[allow(dead_code)]
pub enum Response {
    Results(SuiteResults),
    Fail(SuiteError),
    Panic(&'static str),
}

pub struct MockSuite {
    kind: AnalysisKind,
    responses: Vec<Response>,
    delays: Vec<Duration>,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockSuite {
    pub fn returning(kind: AnalysisKind, results: SuiteResults) -> Self {
        Self::scripted(kind, vec![Response::Results(results)])
    }

    pub fn failing(kind: AnalysisKind, error: SuiteError) -> Self {
        Self::scripted(kind, vec![Response::Fail(error)])
    }

    pub fn panicking(kind: AnalysisKind, message: &'static str) -> Self {
        Self::scripted(kind, vec![Response::Panic(message)])
    }

    pub fn scripted(kind: AnalysisKind, responses: Vec<Response>) -> Self {
        Self {
            kind,
            responses,
            delays: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay before responding; `delays[n]` applies to call `n`, the last repeats.
    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.with_delays(vec![delay])
    }

    /// Shared counter of `evaluate` calls.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn pick<T: Clone>(items: &[T], call: usize) -> Option<T> {
        items.get(call).or_else(|| items.last()).cloned()
    }
}

impl CategorySuite for MockSuite {
    fn kind(&self) -> AnalysisKind {
        self.kind
    }

    async fn evaluate(&self, _target: &SuiteTarget) -> Result<SuiteResults, SuiteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = Self::pick(&self.delays, call) {
            tokio::time::sleep(delay).await;
        }
        match Self::pick(&self.responses, call) {
            Some(Response::Results(results)) => Ok(results),
            Some(Response::Fail(error)) => Err(error),
            Some(Response::Panic(message)) => panic!("{message}"),
            None => Err(SuiteError::Failed("no scripted response".to_owned())),
        }
    }
}

/// Resolver returning a fixed context, nothing, or an error.
pub struct MockResolver {
    outcome: Result<Option<ManifestContext>, String>,
}

#[allow(dead_code)]
impl MockResolver {
    pub fn found(context: ManifestContext) -> Self {
        Self {
            outcome: Ok(Some(context)),
        }
    }

    pub fn not_found() -> Self {
        Self { outcome: Ok(None) }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_owned()),
        }
    }
}

impl ManifestResolver for MockResolver {
    fn fetch_or_create<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Option<ManifestContext>, ResolveError>> {
        Box::pin(async move {
            self.outcome.clone().map_err(|reason| ResolveError::Fetch {
                url: url.to_owned(),
                reason,
            })
        })
    }
}

/// Analytics sink that records every event it receives.
#[derive(Default)]
pub struct CapturingAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

#[allow(dead_code)]
impl CapturingAnalytics {
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default()
    }
}

impl AnalyticsSink for CapturingAnalytics {
    fn record(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        self.events
            .lock()
            .map_err(|e| AnalyticsError::Rejected(e.to_string()))?
            .push(event);
        Ok(())
    }
}

/// Sink that rejects everything.
pub struct RejectingAnalytics;

impl AnalyticsSink for RejectingAnalytics {
    fn record(&self, _event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        Err(AnalyticsError::Rejected("sink offline".to_owned()))
    }
}
