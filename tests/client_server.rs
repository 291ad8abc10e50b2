//! MediaClient driving a real MediaBackend over HTTP

mod common;

use common::{Outcome, StepEngine, TestServer, drive_view, eventually, is_finished};
use mediagrab::{ClientConfig, Error, Event, FormatKind, JobStatus, MediaClient, ViewState};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_submit_pick_and_fetch_file() {
    let server = TestServer::start(Arc::new(StepEngine::quick())).await;
    let client = server.client();
    let mut events = client.subscribe();
    let mut view = ViewState::default();

    let session = client
        .submit("https://media.example.com/watch?v=42")
        .await
        .expect("extract failed");
    assert_eq!(session.info.title, "Integration Clip");
    assert_eq!(session.info.formats.len(), 2);
    drive_view(&mut events, &mut view, Duration::from_secs(5), |v| {
        matches!(v, ViewState::Ready { .. })
    })
    .await;

    let job = client
        .pick("251", FormatKind::Audio)
        .await
        .expect("start failed");
    assert_eq!(job.status, JobStatus::Preparing);
    let seen = drive_view(&mut events, &mut view, Duration::from_secs(10), is_finished).await;

    let ViewState::Complete {
        job_id,
        download_url,
        ..
    } = &view
    else {
        panic!("expected completion, got {view:?}");
    };
    assert_eq!(*job_id, job.id);
    assert_eq!(*download_url, format!("/download/{}", job.id));

    let percents: Vec<u8> = seen
        .iter()
        .filter_map(|event| match event {
            Event::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert!(!percents.is_empty(), "no progress events: {seen:?}");
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert!(!client.is_polling());

    let response = reqwest::get(format!("{}{}", server.base_url(), download_url))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let disposition = response.headers()["content-disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment"));
    assert_eq!(response.bytes().await.unwrap().len(), 2048);
}

#[tokio::test]
async fn test_engine_failure_reaches_view_verbatim() {
    let engine = StepEngine::new(
        vec![30.0],
        Duration::from_millis(100),
        Outcome::Fail("HTTP Error 429: Too Many Requests".to_string()),
    );
    let server = TestServer::start(Arc::new(engine)).await;
    let client = server.client();
    let mut events = client.subscribe();
    let mut view = ViewState::default();

    client
        .submit("https://media.example.com/watch?v=42")
        .await
        .unwrap();
    client.pick("137", FormatKind::Video).await.unwrap();
    drive_view(&mut events, &mut view, Duration::from_secs(10), is_finished).await;

    match &view {
        ViewState::Error { session, message } => {
            assert_eq!(
                message,
                "An error occurred during the download: HTTP Error 429: Too Many Requests"
            );
            assert!(session.is_some(), "the session survives a failed job");
        }
        other => panic!("expected error view, got {other:?}"),
    }
    assert!(!client.is_polling());
}

#[tokio::test]
async fn test_blank_url_never_reaches_server() {
    let server = TestServer::start(Arc::new(StepEngine::quick())).await;
    let client = server.client();

    let err = client.submit("   ").await.unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(server.backend.stats().sessions, 0);
}

#[tokio::test]
async fn test_rejected_url_is_remote_error() {
    let server = TestServer::start(Arc::new(StepEngine::quick())).await;
    let client = server.client();
    let mut events = client.subscribe();
    let mut view = ViewState::default();

    let err = client.submit("ftp://media.example.com/file").await.unwrap_err();

    assert!(matches!(err, Error::Remote { .. }), "got {err:?}");
    drive_view(&mut events, &mut view, Duration::from_secs(5), |v| {
        matches!(v, ViewState::Error { .. })
    })
    .await;
    assert_eq!(server.backend.stats().sessions, 0);
}

#[tokio::test]
async fn test_unknown_format_is_remote_error() {
    let server = TestServer::start(Arc::new(StepEngine::quick())).await;
    let client = server.client();

    client
        .submit("https://media.example.com/watch?v=42")
        .await
        .unwrap();
    let err = client.pick("137", FormatKind::Audio).await.unwrap_err();

    assert!(matches!(err, Error::Remote { .. }), "got {err:?}");
    assert!(client.current_job().is_none());
    assert_eq!(server.backend.stats().jobs, 0);
}

#[tokio::test]
async fn test_resubmit_releases_previous_session() {
    let server = TestServer::start(Arc::new(StepEngine::quick())).await;
    let client = server.client();

    let first = client
        .submit("https://media.example.com/watch?v=1")
        .await
        .unwrap();
    let second = client
        .submit("https://media.example.com/watch?v=2")
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    eventually("previous session released", || {
        server.backend.stats().sessions == 1
    })
    .await;
    assert_eq!(client.current_session().map(|s| s.id), Some(second.id));
}

#[tokio::test]
async fn test_reset_cancels_running_job_on_server() {
    let engine = StepEngine::new(vec![10.0], Duration::from_millis(50), Outcome::Hang);
    let server = TestServer::start(Arc::new(engine)).await;
    let client = server.client();
    let mut events = client.subscribe();
    let mut view = ViewState::default();

    client
        .submit("https://media.example.com/watch?v=42")
        .await
        .unwrap();
    client.pick("137", FormatKind::Video).await.unwrap();
    drive_view(&mut events, &mut view, Duration::from_secs(5), |v| {
        matches!(v, ViewState::Downloading { percent: 10, .. })
    })
    .await;

    client.reset();
    drive_view(&mut events, &mut view, Duration::from_secs(5), |v| {
        *v == ViewState::Idle
    })
    .await;

    assert!(!client.is_polling());
    assert!(client.current_session().is_none());
    eventually("backend session and job released", || {
        let stats = server.backend.stats();
        stats.sessions == 0 && stats.jobs == 0 && stats.active_jobs == 0
    })
    .await;
}

#[tokio::test]
async fn test_unreachable_backend_gives_generic_message() {
    let config = ClientConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        stall_timeout: None,
        ..ClientConfig::default()
    };
    let client = MediaClient::new(&config).unwrap();

    let err = client
        .submit("https://media.example.com/watch?v=42")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport { .. }), "got {err:?}");
    assert_eq!(
        err.user_message(),
        "An error occurred while extracting the media information. Please try again."
    );
    assert!(!client.is_loading());
}
