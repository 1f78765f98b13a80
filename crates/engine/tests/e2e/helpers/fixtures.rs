//! Result fixtures and orchestrator factories.

use std::sync::Arc;

use serde_json::json;

use pwa_report_core::config::AnalysisConfig;
use pwa_report_core::store::MemoryStore;
use pwa_report_core::{
    AnalysisKind, AnalyticsSink, Category, Manifest, ManifestContext, MissingField, StateStore,
    SuiteResults, TestResult, Validation,
};
use pwa_report_engine::{Orchestrator, ReportSession};

use super::mocks::{CapturingAnalytics, MockResolver, MockSuite};

pub const SITE: &str = "https://app.example.com";

#[allow(dead_code)]
pub fn manifest_context() -> ManifestContext {
    ManifestContext {
        manifest: Manifest::from_value(json!({
            "name": "Example App",
            "short_name": "Example",
            "start_url": "/",
            "theme_color": "#1a237e",
            "icons": [{ "src": "icon-512.png", "sizes": "512x512" }]
        })),
        manifest_url: Some(format!("{SITE}/manifest.json")),
        site_url: SITE.to_owned(),
    }
}

pub fn validation(member: &str, valid: bool, category: Category) -> Validation {
    Validation {
        member: member.to_owned(),
        valid,
        category,
        test_required: category == Category::Required,
        display_string: Some(format!("Manifest has {member} field")),
        error_string: Some(format!("Add a valid {member} to your manifest")),
    }
}

/// Two passing required members, one failing recommended member, one missing field.
#[allow(dead_code)]
pub fn packageable_manifest() -> SuiteResults {
    SuiteResults::Manifest {
        validations: vec![
            validation("short_name", true, Category::Required),
            validation("theme_color", false, Category::Recommended),
            validation("name", true, Category::Required),
        ],
        missing: vec![MissingField {
            member: "shortcuts".to_owned(),
            category: Category::Optional,
        }],
    }
}

#[allow(dead_code)]
pub fn blocked_manifest() -> SuiteResults {
    SuiteResults::Manifest {
        validations: vec![
            validation("name", true, Category::Required),
            validation("icons", false, Category::Required),
        ],
        missing: Vec::new(),
    }
}

#[allow(dead_code)]
pub fn healthy_service_worker() -> SuiteResults {
    SuiteResults::Checks(vec![
        TestResult::new(Category::Required, true, "Has a Service Worker"),
        TestResult::new(Category::Recommended, true, "Has offline support"),
        TestResult::new(Category::Optional, false, "Has push notifications"),
    ])
}

#[allow(dead_code)]
pub fn missing_service_worker() -> SuiteResults {
    SuiteResults::Checks(vec![TestResult::new(
        Category::Required,
        false,
        "Has a Service Worker",
    )])
}

#[allow(dead_code)]
pub fn secure_site() -> SuiteResults {
    SuiteResults::Checks(vec![
        TestResult::new(Category::Required, true, "Uses HTTPS"),
        TestResult::new(Category::Required, true, "Has valid SSL certificate"),
        TestResult::new(Category::Required, true, "No mixed content on page"),
    ])
}

#[allow(dead_code)]
pub fn insecure_site() -> SuiteResults {
    SuiteResults::Checks(vec![
        TestResult::new(Category::Required, false, "Uses HTTPS"),
        TestResult::new(Category::Required, true, "Has valid SSL certificate"),
        TestResult::new(Category::Optional, false, "No mixed content on page"),
    ])
}

/// Orchestrator plus its store, built from three suites in any order.
pub fn orchestrator(
    resolver: MockResolver,
    suites: [MockSuite; 3],
) -> (Arc<Orchestrator>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let mut builder = Orchestrator::builder()
        .resolver(Arc::new(resolver))
        .store(Arc::clone(&store) as Arc<dyn StateStore>);
    for suite in suites {
        builder = builder.suite(Arc::new(suite));
    }
    let orchestrator = builder.build().expect("orchestrator should build");
    (Arc::new(orchestrator), store)
}

/// Orchestrator whose suites always return passing results.
#[allow(dead_code)]
pub fn healthy_orchestrator() -> (Arc<Orchestrator>, Arc<MemoryStore>) {
    orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, packageable_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, healthy_service_worker()),
            MockSuite::returning(AnalysisKind::Security, secure_site()),
        ],
    )
}

#[allow(dead_code)]
pub fn session(orchestrator: Arc<Orchestrator>) -> (ReportSession, Arc<CapturingAnalytics>) {
    let analytics = Arc::new(CapturingAnalytics::default());
    let session = ReportSession::new(
        orchestrator,
        Arc::clone(&analytics) as Arc<dyn AnalyticsSink>,
        &AnalysisConfig::default(),
    );
    (session, analytics)
}
