//! Per-branch fault isolation: one failing or panicking suite never aborts
//! the other two, and never counts as passing.

use std::time::Duration;

use pwa_report_core::store::MANIFEST_TESTS_KEY;
use pwa_report_core::{AnalysisKind, StateStore, SuiteError};
use pwa_report_engine::report::{Verdict, decide_verdict};
use pwa_report_engine::{EngineError, Orchestrator, RunPhase};

use crate::helpers::fixtures::*;
use crate::helpers::mocks::*;

#[tokio::test]
async fn test_e2e_malformed_manifest_degrades_only_manifest() {
    // Given: manifest validation rejects the document
    let (orchestrator, store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::failing(
                AnalysisKind::Manifest,
                SuiteError::MalformedManifest("expected a JSON object".to_owned()),
            ),
            MockSuite::returning(AnalysisKind::ServiceWorker, healthy_service_worker()),
            MockSuite::returning(AnalysisKind::Security, secure_site()),
        ],
    );

    // When
    let run = orchestrator.run_all_tests(SITE).await.unwrap();

    // Then: the other categories completed normally
    assert_eq!(run.phase, RunPhase::Complete);
    assert_eq!(run.score(AnalysisKind::ServiceWorker).tally.valid_count, 2);
    assert_eq!(run.score(AnalysisKind::Security).tally.valid_count, 3);

    // and the failed category is surfaced as empty, not passing
    let manifest = run.score(AnalysisKind::Manifest);
    assert!(!manifest.loading);
    assert_eq!(manifest.tally.total_count, 0);
    assert_eq!(manifest.tally.valid_count, 0);
    assert!(manifest.error.is_some(), "error must be surfaced");
    assert_eq!(run.can_package_list[0], Some(false));
    assert_eq!(run.packageable(), Some(false));
    assert_eq!(
        decide_verdict(AnalysisKind::Manifest, manifest, run.created_manifest),
        Verdict::None
    );

    // failed results are not persisted
    assert!(store.get(MANIFEST_TESTS_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_e2e_unreachable_site_keeps_manifest_results() {
    let (orchestrator, _store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, packageable_manifest()),
            MockSuite::failing(
                AnalysisKind::ServiceWorker,
                SuiteError::Unreachable {
                    url: SITE.to_owned(),
                    reason: "dns error".to_owned(),
                },
            ),
            MockSuite::failing(
                AnalysisKind::Security,
                SuiteError::Unreachable {
                    url: SITE.to_owned(),
                    reason: "dns error".to_owned(),
                },
            ),
        ],
    );

    let run = orchestrator.run_all_tests(SITE).await.unwrap();

    assert_eq!(run.score(AnalysisKind::Manifest).tally.total_count, 4);
    assert!(run.score(AnalysisKind::ServiceWorker).error.is_some());
    assert!(run.score(AnalysisKind::Security).error.is_some());
    assert_eq!(run.can_package_list, [Some(true), Some(false), Some(false)]);
}

#[tokio::test]
async fn test_e2e_panicking_suite_is_isolated() {
    // Given: the security suite panics mid-run while service worker is slow
    let (orchestrator, _store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, packageable_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, healthy_service_worker())
                .with_delay(Duration::from_millis(20)),
            MockSuite::panicking(AnalysisKind::Security, "tls probe blew up"),
        ],
    );

    // When
    let run = orchestrator.run_all_tests(SITE).await.unwrap();

    // Then
    assert!(run.is_complete());
    assert!(!run.score(AnalysisKind::ServiceWorker).loading);
    let security = run.score(AnalysisKind::Security);
    assert!(!security.loading);
    assert!(
        security.error.as_deref().is_some_and(|e| e.contains("panicked")),
        "panic must be reported: {:?}",
        security.error
    );
    assert_eq!(run.packageable(), Some(false));
}

#[test]
fn test_e2e_builder_requires_every_category() {
    let result = Orchestrator::builder()
        .resolver(std::sync::Arc::new(MockResolver::not_found()))
        .store(std::sync::Arc::new(pwa_report_core::store::MemoryStore::new()))
        .suite(std::sync::Arc::new(MockSuite::returning(
            AnalysisKind::Manifest,
            packageable_manifest(),
        )))
        .build();

    assert!(matches!(
        result,
        Err(EngineError::MissingSuite(AnalysisKind::ServiceWorker))
    ));
}

#[test]
fn test_e2e_builder_rejects_duplicate_category() {
    let result = Orchestrator::builder()
        .resolver(std::sync::Arc::new(MockResolver::not_found()))
        .store(std::sync::Arc::new(pwa_report_core::store::MemoryStore::new()))
        .suite(std::sync::Arc::new(MockSuite::returning(
            AnalysisKind::Security,
            secure_site(),
        )))
        .suite(std::sync::Arc::new(MockSuite::returning(
            AnalysisKind::Security,
            insecure_site(),
        )))
        .build();

    assert!(matches!(
        result,
        Err(EngineError::DuplicateSuite(AnalysisKind::Security))
    ));
}

#[test]
fn test_e2e_built_profiles_unwind_panics() {
    // Test builds always unwind, so the panic isolation above only holds for
    // the shipped binary if no workspace profile switches to abort.
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../Cargo.toml");
    let raw = std::fs::read_to_string(path).expect("workspace manifest readable");
    let manifest: toml::Table = toml::from_str(&raw).expect("workspace manifest is TOML");

    let Some(profiles) = manifest.get("profile").and_then(|p| p.as_table()) else {
        return;
    };
    for (name, profile) in profiles {
        let strategy = profile.get("panic").and_then(|v| v.as_str());
        assert_ne!(
            strategy,
            Some("abort"),
            "profile.{name} aborts on panic, a panicking suite would kill the process"
        );
    }
}
