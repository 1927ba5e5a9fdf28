//! Integration tests for /story/generate.

mod common;

use common::{ok_fragments, spawn_app, TEST_API_KEY};
use imagegen_service::services::backend::mock::MockImageBackend;
use imagegen_service::services::backend::{BackendError, Fragment};
use serde_json::json;
use std::sync::Arc;

const DESCRIPTION: &str = "A lighthouse keeper rescues a stranded whale over one long night.";

fn story_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/story/generate", port)
}

#[tokio::test]
async fn sequence_is_ordered_with_positional_hints() {
    let backend = Arc::new(MockImageBackend::returning(ok_fragments()));
    let port = spawn_app(backend.clone()).await;

    let response = reqwest::Client::new()
        .post(story_url(port))
        .bearer_auth(TEST_API_KEY)
        .json(&json!({ "description": DESCRIPTION, "num_images": 5 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    let images = body["images"].as_array().unwrap();
    let numbers: Vec<u64> = images
        .iter()
        .map(|item| item["sequence_number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(body["story_metadata"]["total_images"], 5);
    assert_eq!(body["story_metadata"]["total_tokens"], 5 * 1335);
    assert_eq!(body["story_metadata"]["tokens_estimated"], json!(true));

    let instructions = backend.recorded_instructions();
    assert_eq!(instructions.len(), 5);
    assert!(instructions[0].contains("beginning"));
    assert!(instructions[1].contains("middle"));
    assert!(instructions[3].contains("middle"));
    assert!(instructions[4].contains("conclusion"));
    assert!(instructions[2].contains("image 3 of 5"));
}

#[tokio::test]
async fn count_bounds_come_from_configuration() {
    let backend = Arc::new(MockImageBackend::returning(ok_fragments()));
    let port = spawn_app(backend.clone()).await;
    let client = reqwest::Client::new();

    for bad_count in [0, 1, 16] {
        let response = client
            .post(story_url(port))
            .bearer_auth(TEST_API_KEY)
            .json(&json!({ "description": DESCRIPTION, "num_images": bad_count }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "count {} must be rejected", bad_count);
    }

    assert!(backend.recorded_instructions().is_empty());
}

#[tokio::test]
async fn image_less_steps_shrink_the_result() {
    let backend = Arc::new(MockImageBackend::returning(ok_fragments()));
    // Step 2 yields only text.
    backend.enqueue(Ok(ok_fragments()));
    backend.enqueue(Ok(vec![Fragment::Text("nothing to see".to_string())]));
    let port = spawn_app(backend).await;

    let response = reqwest::Client::new()
        .post(story_url(port))
        .bearer_auth(TEST_API_KEY)
        .json(&json!({ "description": DESCRIPTION, "num_images": 3 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    let numbers: Vec<u64> = body["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["sequence_number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 3]);
    assert_eq!(body["story_metadata"]["total_images"], 2);
    // Every issued step still counts toward the token estimate.
    assert_eq!(body["story_metadata"]["total_tokens"], 3 * 1335);
}

#[tokio::test]
async fn a_mid_run_failure_fails_the_whole_request() {
    let backend = Arc::new(MockImageBackend::returning(ok_fragments()));
    backend.enqueue(Ok(ok_fragments()));
    backend.enqueue(Err(BackendError::Api("boom".to_string())));
    let port = spawn_app(backend.clone()).await;

    let response = reqwest::Client::new()
        .post(story_url(port))
        .bearer_auth(TEST_API_KEY)
        .json(&json!({ "description": DESCRIPTION, "num_images": 4 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    // Steps after the failure were never issued.
    assert_eq!(backend.recorded_instructions().len(), 2);
}

#[tokio::test]
async fn short_descriptions_are_rejected() {
    let backend = Arc::new(MockImageBackend::returning(ok_fragments()));
    let port = spawn_app(backend).await;

    let response = reqwest::Client::new()
        .post(story_url(port))
        .bearer_auth(TEST_API_KEY)
        .json(&json!({ "description": "too short", "num_images": 3 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}
