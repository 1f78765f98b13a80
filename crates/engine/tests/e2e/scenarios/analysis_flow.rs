//! Full analysis runs: scoring, todos, persistence, and incremental publication.

use std::collections::HashSet;
use std::time::Duration;

use pwa_report_core::store::{
    MANIFEST_TESTS_KEY, SECURITY_TESTS_KEY, SERVICE_WORKER_TESTS_KEY,
};
use pwa_report_core::{AnalysisKind, StateStore};
use pwa_report_engine::todo::SW_MODAL_FIELD;
use pwa_report_engine::{RunPhase, TodoStatus};

use crate::helpers::fixtures::*;
use crate::helpers::mocks::*;

#[tokio::test]
async fn test_e2e_healthy_site_is_packageable() {
    // Given
    let (orchestrator, _store) = healthy_orchestrator();

    // When
    let run = orchestrator.run_all_tests(SITE).await.unwrap();

    // Then
    assert_eq!(run.phase, RunPhase::Complete);
    assert_eq!(run.packageable(), Some(true));
    assert!(!run.created_manifest);

    let manifest = run.score(AnalysisKind::Manifest);
    assert_eq!(manifest.tally.valid_count, 2);
    assert_eq!(manifest.tally.total_count, 4, "missing fields count toward total");
    assert_eq!(manifest.tally.required_failure_count, 0);

    assert_eq!(run.score(AnalysisKind::ServiceWorker).tally.valid_count, 2);
    assert_eq!(run.score(AnalysisKind::Security).tally.total_count, 3);

    // theme_color (failing) + shortcuts (missing) + push notifications
    assert_eq!(run.todos.len(), 3);
    assert!(run.todos.iter().all(|t| t.status == TodoStatus::Yellow));
}

#[tokio::test]
async fn test_e2e_missing_service_worker_single_todo() {
    // Given: the service worker suite reports one failing required check
    let (orchestrator, _store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, packageable_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, missing_service_worker()),
            MockSuite::returning(AnalysisKind::Security, secure_site()),
        ],
    );

    // When
    let run = orchestrator.run_all_tests(SITE).await.unwrap();

    // Then
    let sw = run.score(AnalysisKind::ServiceWorker);
    assert_eq!(sw.tally.required_failure_count, 1);
    assert_eq!(run.can_package_list[1], Some(false));
    assert_eq!(run.packageable(), Some(false));

    let sw_todos: Vec<_> = run.todos.iter().filter(|t| t.card == "sw-details").collect();
    assert_eq!(sw_todos.len(), 1);
    assert_eq!(sw_todos[0].field, SW_MODAL_FIELD);
}

#[tokio::test]
async fn test_e2e_raw_results_are_persisted() {
    let (orchestrator, store) = healthy_orchestrator();

    orchestrator.run_all_tests(SITE).await.unwrap();

    let manifest = store.get(MANIFEST_TESTS_KEY).await.unwrap().expect("manifest results stored");
    let entries = manifest.as_array().expect("array of validations");
    assert_eq!(entries.len(), 3, "missing fields are not raw results");
    // valid validations first, then by member
    assert_eq!(entries[0]["member"], "name");
    assert_eq!(entries[1]["member"], "short_name");
    assert_eq!(entries[2]["member"], "theme_color");

    assert!(store.get(SERVICE_WORKER_TESTS_KEY).await.unwrap().is_some());
    let security = store.get(SECURITY_TESTS_KEY).await.unwrap().unwrap();
    assert_eq!(security[0]["infoString"], "Uses HTTPS");
}

#[tokio::test]
async fn test_e2e_missing_manifest_is_synthesized() {
    let (orchestrator, _store) = orchestrator(
        MockResolver::not_found(),
        [
            MockSuite::returning(AnalysisKind::Manifest, blocked_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, healthy_service_worker()),
            MockSuite::returning(AnalysisKind::Security, secure_site()),
        ],
    );

    let run = orchestrator.run_all_tests(SITE).await.unwrap();

    assert!(run.created_manifest);
    let context = run.manifest.expect("synthesized context is published");
    assert_eq!(context.site_url, SITE);
    assert!(context.manifest_url.is_none());
}

#[tokio::test]
async fn test_e2e_resolver_error_synthesizes_instead_of_failing() {
    let (orchestrator, _store) = orchestrator(
        MockResolver::failing("connection reset"),
        [
            MockSuite::returning(AnalysisKind::Manifest, packageable_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, healthy_service_worker()),
            MockSuite::returning(AnalysisKind::Security, secure_site()),
        ],
    );

    let run = orchestrator.run_all_tests(SITE).await.unwrap();

    assert!(run.created_manifest);
    assert_eq!(run.phase, RunPhase::Complete);
}

#[tokio::test]
async fn test_e2e_rerun_is_idempotent() {
    let (orchestrator, _store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, blocked_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, healthy_service_worker()),
            MockSuite::returning(AnalysisKind::Security, insecure_site()),
        ],
    );

    let first = orchestrator.run_all_tests(SITE).await.unwrap();
    let second = orchestrator.run_all_tests(SITE).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    for kind in AnalysisKind::ALL {
        assert_eq!(first.score(kind), second.score(kind), "{kind} differs between runs");
    }
    let a: HashSet<_> = first.todos.into_iter().collect();
    let b: HashSet<_> = second.todos.into_iter().collect();
    assert_eq!(a, b);
}

#[tokio::test(start_paused = true)]
async fn test_e2e_categories_publish_incrementally() {
    // Given: suites that settle at 0s, 5s and 10s
    let (orchestrator, _store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, packageable_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, healthy_service_worker())
                .with_delay(Duration::from_secs(5)),
            MockSuite::returning(AnalysisKind::Security, secure_site())
                .with_delay(Duration::from_secs(10)),
        ],
    );
    let mut rx = orchestrator.subscribe();
    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let run = rx.borrow_and_update().clone();
            let done = run.is_complete();
            seen.push(run);
            if done {
                break;
            }
        }
        seen
    });

    // When
    let run = orchestrator.run_all_tests(SITE).await.unwrap();
    let seen = observer.await.unwrap();

    // Then: manifest was visible while the other two were still loading
    assert!(run.is_complete());
    assert!(
        seen.iter().any(|r| r.phase == RunPhase::PartiallyComplete
            && !r.score(AnalysisKind::Manifest).loading
            && r.score(AnalysisKind::Security).loading),
        "expected an incremental state, saw {} states",
        seen.len()
    );
    for state in &seen {
        let any_loading = state.scores.iter().any(|s| s.loading);
        assert!(
            !(any_loading && state.can_package),
            "can_package must never be true while loading"
        );
    }
}
