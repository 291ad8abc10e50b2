//! Waiting helpers for end-to-end tests

use mediagrab::{Event, ViewState};
use std::time::Duration;
use tokio::sync::broadcast;

/// Fold events into `view` until `done` accepts it
///
/// Returns every event seen. Panics after `timeout`.
pub async fn drive_view(
    events: &mut broadcast::Receiver<Event>,
    view: &mut ViewState,
    timeout: Duration,
    done: impl Fn(&ViewState) -> bool,
) -> Vec<Event> {
    let mut seen = Vec::new();
    let result = tokio::time::timeout(timeout, async {
        while !done(view) {
            let event = events.recv().await.expect("event channel closed");
            view.apply(&event);
            seen.push(event);
        }
    })
    .await;
    assert!(result.is_ok(), "view never settled, last: {view:?}, events: {seen:?}");
    seen
}

/// Whether the view reached a terminal state of a download
pub fn is_finished(view: &ViewState) -> bool {
    matches!(view, ViewState::Complete { .. } | ViewState::Error { .. })
}

/// Check `condition` every 20 ms until it holds, panicking after five seconds
pub async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "timed out: {what}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
