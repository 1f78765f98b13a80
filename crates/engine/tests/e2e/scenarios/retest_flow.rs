//! Confirmation-gated retests through the report session.

use std::sync::atomic::Ordering;
use std::time::Duration;

use pwa_report_core::AnalysisKind;
use pwa_report_core::config::AnalysisConfig;
use pwa_report_engine::todo::retest_todo;
use pwa_report_engine::{
    EngineError, ReportSession, RetestError, RetestState, TodoAction, TodoStatus,
};

use crate::helpers::fixtures::*;
use crate::helpers::mocks::*;

#[tokio::test(start_paused = true)]
async fn test_e2e_confirmed_retest_waits_then_reruns() {
    // Given: an analyzed site with a retest reminder
    let sw = MockSuite::scripted(
        AnalysisKind::ServiceWorker,
        vec![
            Response::Results(missing_service_worker()),
            Response::Results(healthy_service_worker()),
        ],
    );
    let sw_calls = sw.calls();
    let (orchestrator, _store) = orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, packageable_manifest()),
            sw,
            MockSuite::returning(AnalysisKind::Security, secure_site()),
        ],
    );
    let (mut session, analytics) = session(orchestrator);
    let first = session.analyze(SITE).await.unwrap();
    assert_eq!(first.packageable(), Some(false));

    session.add_retest_todo("a service worker");
    let reminder = session
        .sorted_todos()
        .into_iter()
        .find(|t| t.status == TodoStatus::Retest)
        .expect("retest reminder present");

    // When: the reminder is clicked and the retest confirmed
    let action = session.todo_clicked(&reminder).unwrap();
    assert_eq!(
        action,
        TodoAction::ConfirmRetest {
            thing_to_add: "a service worker".to_owned()
        }
    );
    assert!(session.confirmation_visible());
    assert_eq!(sw_calls.load(Ordering::SeqCst), 1, "no rerun before confirmation");

    let started = tokio::time::Instant::now();
    let rerun = session.retest(true).await.unwrap();

    // Then: the fixed delay elapsed before the rerun
    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert_eq!(sw_calls.load(Ordering::SeqCst), 2);
    assert_eq!(rerun.packageable(), Some(true));
    assert!(
        rerun.todos.iter().all(|t| t.status != TodoStatus::Retest),
        "reset must drop the reminder"
    );
    assert_eq!(session.retest_state(), &RetestState::Ready);
    assert!(!session.confirmation_visible());
    assert!(analytics.names().contains(&"retest_clicked".to_owned()));
}

#[tokio::test(start_paused = true)]
async fn test_e2e_direct_retest_has_no_delay() {
    let (orchestrator, _store) = healthy_orchestrator();
    let (mut session, _analytics) = session(orchestrator);
    session.analyze(SITE).await.unwrap();

    let started = tokio::time::Instant::now();
    let run = session.retest(false).await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(3000));
    assert!(run.is_complete());
    assert_eq!(run.run_id, 3, "analyze, reset, rerun");
}

#[tokio::test]
async fn test_e2e_declined_confirmation_is_a_no_op() {
    let (orchestrator, _store) = healthy_orchestrator();
    let (mut session, _analytics) = session(orchestrator);
    let before = session.analyze(SITE).await.unwrap();

    session.todo_clicked(&retest_todo("icons")).unwrap();
    session.decline_retest();

    assert_eq!(session.retest_state(), &RetestState::Ready);
    assert_eq!(session.snapshot().run_id, before.run_id, "no rerun happened");
}

#[tokio::test]
async fn test_e2e_confirming_without_request_is_rejected() {
    let (orchestrator, _store) = healthy_orchestrator();
    let (mut session, _analytics) = session(orchestrator);
    session.analyze(SITE).await.unwrap();

    let err = session.retest(true).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::Retest(RetestError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_e2e_retest_before_analyze_fails() {
    let (orchestrator, _store) = healthy_orchestrator();
    let (mut session, _analytics) = session(orchestrator);

    assert!(matches!(
        session.retest(false).await,
        Err(EngineError::NoSite)
    ));
}

#[tokio::test]
async fn test_e2e_analytics_failure_does_not_affect_retest() {
    let (orchestrator, _store) = healthy_orchestrator();
    let mut session = ReportSession::new(
        orchestrator,
        std::sync::Arc::new(RejectingAnalytics),
        &AnalysisConfig {
            retest_delay_ms: 0,
            ..AnalysisConfig::default()
        },
    );
    session.analyze(SITE).await.unwrap();

    let run = session.retest(false).await.unwrap();

    assert_eq!(run.packageable(), Some(true));
}
