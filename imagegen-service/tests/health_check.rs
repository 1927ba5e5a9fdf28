//! Integration tests for the health endpoint.

mod common;

use common::{ok_fragments, spawn_app};
use imagegen_service::services::backend::mock::MockImageBackend;
use std::sync::Arc;

#[tokio::test]
async fn health_check_works_without_auth() {
    let backend = Arc::new(MockImageBackend::returning(ok_fragments()));
    let port = spawn_app(backend).await;

    let response = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "imagegen-service");
    assert!(body["timestamp"].is_string());
}
