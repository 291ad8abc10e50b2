use super::test_helpers::*;
use super::*;
use crate::error::{Error, Operation};
use crate::types::{JobId, JobStatus, SessionId};
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;


/// Wait for the next event, failing the test after a minute of (virtual) time
async fn next_event(events: &mut broadcast::Receiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(60), events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

/// Collect events up to and including the first terminal one
async fn until_terminal(events: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = matches!(event, Event::Completed { .. } | Event::Error { .. });
        seen.push(event);
        if done {
            return seen;
        }
    }
}

fn assert_no_pending_events(events: &mut broadcast::Receiver<Event>) {
    match events.try_recv() {
        Err(TryRecvError::Empty) => {}
        other => panic!("expected no pending events, got {other:?}"),
    }
}

fn progress_percents(events: &[Event]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect()
}
