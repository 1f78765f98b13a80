//! Todo building.
//!
//! Converts failing and missing results into flat [`TodoItem`] lists. Each
//! builder is deterministic: the same suite output always yields the same
//! items.

use std::fmt;

use serde::{Deserialize, Serialize};

use pwa_report_core::{AnalysisKind, Category, MissingField, SuiteResults, TestResult, Validation};

use crate::score::is_required_failure;

/// Field of the single item emitted when a service worker is missing.
pub const SW_MODAL_FIELD: &str = "Open SW Modal";
/// Fix text of the single missing-service-worker item.
pub const SW_MODAL_FIX: &str = "Add Service Worker to Base Package";
/// Card id of retest reminders.
pub const RETEST_CARD: &str = "retest";
/// Fix template for missing manifest fields; `~` is the field slot.
pub const MISSING_FIELD_FIX: &str = "Add~to your manifest";

/// Severity of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Red,
    Yellow,
    Retest,
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Yellow => write!(f, "yellow"),
            Self::Retest => write!(f, "retest"),
        }
    }
}

/// A single actionable remediation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Section the item points at (`mani-details`, `sw-details`, `sec-details`, `retest`).
    pub card: String,
    /// Stable key used for ordering and focus lookup.
    pub field: String,
    /// Remediation text, possibly a `~` template.
    pub fix: String,
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_string: Option<String>,
}

impl TodoItem {
    pub fn is_red(&self) -> bool {
        self.status == TodoStatus::Red
    }

    /// Remediation text with the `~` slot filled by the field name.
    pub fn fix_text(&self) -> String {
        if self.fix.contains('~') {
            self.fix.replacen('~', &format!(" {} ", self.field), 1)
        } else {
            self.fix.clone()
        }
    }
}

/// One item per failing validation and one per missing field.
pub fn manifest_todos(validations: &[Validation], missing: &[MissingField]) -> Vec<TodoItem> {
    let card = AnalysisKind::Manifest.card_id();

    let failing = validations.iter().filter(|v| !v.valid).map(|v| TodoItem {
        card: card.to_owned(),
        field: v.member.clone(),
        fix: v
            .error_string
            .clone()
            .or_else(|| v.display_string.clone())
            .unwrap_or_else(|| v.member.clone()),
        status: if is_required_failure(v) {
            TodoStatus::Red
        } else {
            TodoStatus::Yellow
        },
        display_string: Some(v.display_string.clone().unwrap_or_default()),
    });

    let absent = missing.iter().map(|m| TodoItem {
        card: card.to_owned(),
        field: m.member.clone(),
        fix: MISSING_FIELD_FIX.to_owned(),
        status: TodoStatus::Yellow,
        display_string: None,
    });

    failing.chain(absent).collect()
}

/// Service-worker items.
///
/// Any failing required check collapses the category into a single
/// [`SW_MODAL_FIELD`] item; no other service-worker item is emitted then.
pub fn service_worker_todos(results: &[TestResult]) -> Vec<TodoItem> {
    let card = AnalysisKind::ServiceWorker.card_id();

    let missing_worker = results
        .iter()
        .any(|r| !r.result && r.category == Category::Required);
    if missing_worker {
        return vec![TodoItem {
            card: card.to_owned(),
            field: SW_MODAL_FIELD.to_owned(),
            fix: SW_MODAL_FIX.to_owned(),
            status: TodoStatus::Red,
            display_string: None,
        }];
    }

    results
        .iter()
        .filter(|r| !r.result)
        .map(|r| check_item(card, r))
        .collect()
}

/// One item per failing security check.
pub fn security_todos(results: &[TestResult]) -> Vec<TodoItem> {
    let card = AnalysisKind::Security.card_id();
    results
        .iter()
        .filter(|r| !r.result)
        .map(|r| check_item(card, r))
        .collect()
}

fn check_item(card: &str, result: &TestResult) -> TodoItem {
    TodoItem {
        card: card.to_owned(),
        field: result.info_string.clone(),
        fix: result.info_string.clone(),
        status: if result.category == Category::Required {
            TodoStatus::Red
        } else {
            TodoStatus::Yellow
        },
        display_string: None,
    }
}

/// Items for one suite's results.
pub fn build_todos(kind: AnalysisKind, results: &SuiteResults) -> Vec<TodoItem> {
    match (kind, results) {
        (_, SuiteResults::Manifest { validations, missing }) => manifest_todos(validations, missing),
        (AnalysisKind::ServiceWorker, SuiteResults::Checks(checks)) => service_worker_todos(checks),
        (_, SuiteResults::Checks(checks)) => security_todos(checks),
    }
}

/// Reminder to deploy something and retest.
pub fn retest_todo(thing_to_add: &str) -> TodoItem {
    TodoItem {
        card: RETEST_CARD.to_owned(),
        field: "Manifest".to_owned(),
        fix: format!("Add {thing_to_add} to your server and retest your site!"),
        status: TodoStatus::Retest,
        display_string: Some(thing_to_add.to_owned()),
    }
}
