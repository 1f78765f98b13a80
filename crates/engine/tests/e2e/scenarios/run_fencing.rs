//! Overlapping runs and resets: stale outcomes never reach published state.

use std::sync::atomic::Ordering;
use std::time::Duration;

use pwa_report_core::AnalysisKind;
use pwa_report_engine::todo::SW_MODAL_FIELD;
use pwa_report_engine::{EngineError, RunPhase};

use crate::helpers::fixtures::*;
use crate::helpers::mocks::*;

#[tokio::test(start_paused = true)]
async fn test_e2e_newer_run_supersedes_slow_run() {
    // Given: the first service worker call is slow and reports a missing worker,
    // later calls are fast and healthy
    let sw = MockSuite::scripted(
        AnalysisKind::ServiceWorker,
        vec![
            Response::Results(missing_service_worker()),
            Response::Results(healthy_service_worker()),
        ],
    )
    .with_delays(vec![Duration::from_secs(30), Duration::ZERO]);
    let sw_calls = sw.calls();
    let (orchestrator, _store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, packageable_manifest()),
            sw,
            MockSuite::returning(AnalysisKind::Security, secure_site()),
        ],
    );

    let first = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.run_all_tests(SITE).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(sw_calls.load(Ordering::SeqCst), 1, "first run should be in flight");

    // When: a second run starts while the first is still waiting
    let second = orchestrator.run_all_tests(SITE).await.unwrap();
    let first = first.await.unwrap();

    // Then
    assert!(matches!(first, Err(EngineError::Superseded { run_id: 1 })));
    assert_eq!(second.run_id, 2);
    assert_eq!(second.packageable(), Some(true));
    assert!(second.todos.iter().all(|t| t.field != SW_MODAL_FIELD));

    // Let the aborted branch's timer elapse; nothing may leak into state.
    tokio::time::sleep(Duration::from_secs(60)).await;
    let state = orchestrator.snapshot();
    assert_eq!(state.run_id, 2);
    assert_eq!(state.todos, second.todos);
}

#[tokio::test]
async fn test_e2e_reset_clears_everything_atomically() {
    // Given: a completed run with todos
    let (orchestrator, _store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, blocked_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, missing_service_worker()),
            MockSuite::returning(AnalysisKind::Security, insecure_site()),
        ],
    );
    let before = orchestrator.run_all_tests(SITE).await.unwrap();
    assert!(!before.todos.is_empty());

    let mut rx = orchestrator.subscribe();
    rx.borrow_and_update();

    // When
    orchestrator.reset();

    // Then: exactly one new value, and it is fully reset
    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.phase, RunPhase::Idle);
    assert_eq!(state.url, SITE);
    assert!(state.todos.is_empty());
    assert!(state.missing_fields.is_empty());
    assert!(!state.created_manifest);
    assert_eq!(state.can_package_list, [None; 3]);
    for score in &state.scores {
        assert!(score.loading);
        assert_eq!(score.tally.valid_count, 0);
        assert_eq!(score.tally.total_count, 0);
        assert_eq!(score.tally.required_failure_count, 0);
        assert!(score.error.is_none());
    }
    assert!(!rx.has_changed().unwrap());

    // and a run from the reset state matches the first run
    let after = orchestrator.run_all_tests(SITE).await.unwrap();
    for kind in AnalysisKind::ALL {
        assert_eq!(before.score(kind), after.score(kind));
    }
    let mut a = before.todos.clone();
    let mut b = after.todos.clone();
    pwa_report_engine::sort_todos(&mut a);
    pwa_report_engine::sort_todos(&mut b);
    assert_eq!(a, b);
}

#[tokio::test(start_paused = true)]
async fn test_e2e_reset_supersedes_in_flight_run() {
    let (orchestrator, _store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, packageable_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, healthy_service_worker())
                .with_delay(Duration::from_secs(5)),
            MockSuite::returning(AnalysisKind::Security, secure_site()),
        ],
    );

    let run = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.run_all_tests(SITE).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    orchestrator.reset();
    let result = run.await.unwrap();

    assert!(matches!(result, Err(EngineError::Superseded { .. })));
    let state = orchestrator.snapshot();
    assert_eq!(state.phase, RunPhase::Idle);
    assert!(state.todos.is_empty(), "no stale todos after reset");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_e2e_concurrent_runs_never_both_lose() {
    // Given: one orchestrator shared by two callers that start together
    let (orchestrator, _store) = healthy_orchestrator();

    for _ in 0..200 {
        let barrier = std::sync::Arc::new(tokio::sync::Barrier::new(2));
        let spawn_run = || {
            let orchestrator = orchestrator.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                orchestrator.run_all_tests(SITE).await
            })
        };

        // When
        let (a, b) = (spawn_run(), spawn_run());
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        // Then: the run fenced last is the published one and completes
        let winner = [&a, &b]
            .into_iter()
            .filter_map(|result| result.as_ref().ok().map(|run| run.run_id))
            .max()
            .unwrap_or_else(|| panic!("both runs superseded: {a:?} / {b:?}"));
        assert_eq!(orchestrator.snapshot().run_id, winner);
        assert_eq!(orchestrator.snapshot().phase, RunPhase::Complete);
    }
}
