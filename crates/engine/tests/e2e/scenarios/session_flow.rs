//! Todo clicks, paging, and the last-tested label through the report session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use pwa_report_core::AnalysisKind;
use pwa_report_core::StateStore;
use pwa_report_core::store::{self, MemoryStore};
use pwa_report_engine::todo::SW_MODAL_FIELD;
use pwa_report_engine::{IndicatorCounts, PageDot, TodoAction, TodoStatus, watch_last_tested};

use crate::helpers::fixtures::*;
use crate::helpers::mocks::*;

/// Four todos: three red, one yellow.
fn failing_orchestrator() -> (Arc<pwa_report_engine::Orchestrator>, Arc<MemoryStore>) {
    orchestrator(
        MockResolver::found(manifest_context()),
        [
            MockSuite::returning(AnalysisKind::Manifest, blocked_manifest()),
            MockSuite::returning(AnalysisKind::ServiceWorker, missing_service_worker()),
            MockSuite::returning(AnalysisKind::Security, insecure_site()),
        ],
    )
}

#[tokio::test]
async fn test_e2e_todo_clicks_resolve_to_actions() {
    // Given
    let (orchestrator, _store) = failing_orchestrator();
    let (mut session, analytics) = session(orchestrator);
    session.analyze(SITE).await.unwrap();
    let todos = session.sorted_todos();

    // When / Then: the service worker item opens the selector
    let sw = todos.iter().find(|t| t.field == SW_MODAL_FIELD).unwrap();
    assert_eq!(
        session.todo_clicked(sw).unwrap(),
        TodoAction::OpenServiceWorkerSelector {
            card: "sw-details".to_owned()
        }
    );

    // and a manifest item focuses its check
    let icons = todos.iter().find(|t| t.field == "icons").unwrap();
    match session.todo_clicked(icons).unwrap() {
        TodoAction::Focus { card, field, display_string } => {
            assert_eq!(card, "mani-details");
            assert_eq!(field, "icons");
            assert_eq!(display_string.as_deref(), Some("Manifest has icons field"));
        }
        other => panic!("unexpected action: {other:?}"),
    }

    assert_eq!(
        analytics.names(),
        vec!["todo_item_clicked", "sw_selector_opened", "todo_item_clicked"]
    );
}

#[tokio::test]
async fn test_e2e_todos_sort_red_first_then_by_field() {
    let (orchestrator, _store) = failing_orchestrator();
    let (mut session, _analytics) = session(orchestrator);
    session.analyze(SITE).await.unwrap();

    let fields: Vec<_> = session.sorted_todos().into_iter().map(|t| t.field).collect();

    assert_eq!(
        fields,
        vec![SW_MODAL_FIELD, "Uses HTTPS", "icons", "No mixed content on page"]
    );
    assert_eq!(session.indicators(), IndicatorCounts { red: 3, other: 1 });
}

#[tokio::test]
async fn test_e2e_pages_cover_every_todo_once() {
    // Given: four analysis todos plus three retest reminders
    let (orchestrator, _store) = failing_orchestrator();
    let (mut session, _analytics) = session(orchestrator);
    session.analyze(SITE).await.unwrap();
    for thing in ["icons", "a service worker", "HTTPS"] {
        session.add_retest_todo(thing);
    }
    assert_eq!(session.indicators().total(), 7);

    // When: walking the pages forward
    let first = session.current_page();
    assert_eq!(session.switch_page(true), 2);
    let second = session.current_page();
    assert_eq!(session.switch_page(true), 2, "no page past the end");

    // Then: the pages concatenate to the sorted list
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 2);
    let joined: Vec<_> = first.into_iter().chain(second).collect();
    assert_eq!(joined, session.sorted_todos());
    assert_eq!(
        session.dots(),
        vec![
            PageDot { page: 1, active: false },
            PageDot { page: 2, active: true },
        ]
    );

    assert_eq!(session.switch_page(false), 1);
    assert_eq!(session.switch_page(false), 1, "no page before the first");
    assert_eq!(session.set_page(9), 2);
}

#[tokio::test]
async fn test_e2e_retest_reminders_sort_with_yellow_items() {
    let (orchestrator, _store) = healthy_orchestrator();
    let (mut session, _analytics) = session(orchestrator);
    session.analyze(SITE).await.unwrap();

    session.add_retest_todo("a service worker");
    let reminder = session
        .sorted_todos()
        .into_iter()
        .find(|t| t.status == TodoStatus::Retest)
        .unwrap();

    assert_eq!(reminder.card, "retest");
    assert_eq!(
        reminder.fix,
        "Add a service worker to your server and retest your site!"
    );
    assert_eq!(session.indicators(), IndicatorCounts { red: 0, other: 4 });
}

#[tokio::test]
async fn test_e2e_last_tested_label_after_analyze() {
    let (orchestrator, _store) = healthy_orchestrator();
    let (mut session, _analytics) = session(orchestrator);
    assert_eq!(session.last_tested_label().await.unwrap(), None);

    session.analyze(SITE).await.unwrap();

    assert_eq!(
        session.last_tested_label().await.unwrap().as_deref(),
        Some("Last tested seconds ago")
    );
}

#[tokio::test(start_paused = true)]
async fn test_e2e_last_tested_watch_publishes_until_shutdown() {
    // Given: a stamped store
    let store = Arc::new(MemoryStore::new());
    store::stamp_last_tested(store.as_ref(), Utc::now()).await.unwrap();
    let shutdown = CancellationToken::new();

    // When
    let mut rx = watch_last_tested(
        Arc::clone(&store) as Arc<dyn StateStore>,
        Duration::from_secs(120),
        shutdown.clone(),
    );

    // Then: the first tick publishes immediately
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().as_deref(), Some("Last tested seconds ago"));

    // and the next one after the interval
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_some());

    shutdown.cancel();
    assert!(rx.changed().await.is_err(), "watcher stops after shutdown");
}
