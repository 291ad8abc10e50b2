use super::test_helpers::*;
use super::*;
use crate::protocol::StatusResponse;
use crate::types::FormatKind;
use std::sync::atomic::Ordering;
use std::time::Duration;


/// Extract the sample URL and return the new session id
async fn extract_sample(backend: &MediaBackend) -> SessionId {
    backend
        .extract("https://media.example.com/watch?v=1")
        .await
        .unwrap()
        .id
}
