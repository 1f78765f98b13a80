//! Score aggregation.
//!
//! Pure reductions from raw suite results to per-category tallies. The
//! orchestrator owns the resulting [`CategoryScore`] values; nothing here
//! touches shared state.

use serde::{Deserialize, Serialize};

use pwa_report_core::{Category, MissingField, TestResult, Validation};

/// Counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTally {
    pub valid_count: usize,
    pub total_count: usize,
    pub required_failure_count: usize,
}

impl ScoreTally {
    /// Checks that did not pass. Missing manifest fields count here too.
    pub fn failure_count(&self) -> usize {
        self.total_count.saturating_sub(self.valid_count)
    }

    /// Fraction of passing checks, or `None` when there is nothing to score.
    pub fn ratio(&self) -> Option<f64> {
        if self.total_count == 0 {
            return None;
        }
        Some(self.valid_count as f64 / self.total_count as f64)
    }

    /// Every check passed and there was at least one check.
    pub fn is_perfect(&self) -> bool {
        self.total_count > 0 && self.valid_count == self.total_count
    }

    pub fn has_required_failures(&self) -> bool {
        self.required_failure_count > 0
    }
}

/// Whether a failing validation blocks packaging.
pub fn is_required_failure(validation: &Validation) -> bool {
    !validation.valid && (validation.category == Category::Required || validation.test_required)
}

/// Tallies manifest validations plus fields absent from the manifest.
///
/// Missing fields never appear in `validations`; they only grow the total.
pub fn aggregate_manifest(validations: &[Validation], missing: &[MissingField]) -> ScoreTally {
    ScoreTally {
        valid_count: validations.iter().filter(|v| v.valid).count(),
        total_count: validations.len() + missing.len(),
        required_failure_count: validations.iter().filter(|v| is_required_failure(v)).count(),
    }
}

/// Tallies service-worker or security check results.
pub fn aggregate_checks(results: &[TestResult]) -> ScoreTally {
    ScoreTally {
        valid_count: results.iter().filter(|r| r.result).count(),
        total_count: results.len(),
        required_failure_count: results
            .iter()
            .filter(|r| !r.result && r.category == Category::Required)
            .count(),
    }
}

/// Per-category state owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    #[serde(flatten)]
    pub tally: ScoreTally,
    pub loading: bool,
    /// Set when the suite failed; the tally stays at zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for CategoryScore {
    fn default() -> Self {
        Self::pending()
    }
}

impl CategoryScore {
    /// Initial state at the start of every run.
    pub fn pending() -> Self {
        Self {
            tally: ScoreTally::default(),
            loading: true,
            error: None,
        }
    }

    pub fn loaded(tally: ScoreTally) -> Self {
        Self {
            tally,
            loading: false,
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            tally: ScoreTally::default(),
            loading: false,
            error: Some(reason.into()),
        }
    }

    /// The category settled without required failures and without a suite error.
    pub fn passes(&self) -> bool {
        !self.loading && self.error.is_none() && !self.tally.has_required_failures()
    }
}
