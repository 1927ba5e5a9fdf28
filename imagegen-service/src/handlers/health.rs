use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Deliberately does not touch the backend: the hosted API's
/// availability is its own concern.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now(),
            "service": "imagegen-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
