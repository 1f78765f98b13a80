//! Engine error types.

use pwa_report_core::{AnalysisKind, ReportError, StoreError};

/// Errors from the retest state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetestError {
    /// The requested transition is not allowed from the current state.
    #[error("cannot {action} while retest is {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

/// Top-level engine error.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A suite kind was not registered with the orchestrator builder.
    #[error("no suite registered for {0}")]
    MissingSuite(AnalysisKind),

    /// The same suite kind was registered twice.
    #[error("suite registered twice for {0}")]
    DuplicateSuite(AnalysisKind),

    /// A builder dependency was not provided.
    #[error("orchestrator builder missing {0}")]
    MissingDependency(&'static str),

    /// A newer run (or a reset) replaced this run before it completed.
    #[error("analysis run {run_id} was superseded")]
    Superseded { run_id: u64 },

    /// A retest was requested before any site was analyzed.
    #[error("no site has been analyzed yet")]
    NoSite,

    #[error(transparent)]
    Retest(#[from] RetestError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
