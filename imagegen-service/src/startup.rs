//! Application startup and lifecycle management.

use crate::config::ImagegenConfig;
use crate::handlers;
use crate::services::backend::gemini::{GeminiConfig, GeminiImageBackend};
use crate::services::backend::ImageBackend;
use crate::services::gateway::BackendGateway;
use crate::services::sessions::SessionRegistry;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::auth::{require_bearer, BearerSecret};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ImagegenConfig,
    pub gateway: BackendGateway,
    pub sessions: Arc<SessionRegistry>,
    pub backend: Arc<dyn ImageBackend>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application against the Gemini backend.
    pub async fn build(config: ImagegenConfig) -> Result<Self, AppError> {
        let backend: Arc<dyn ImageBackend> = Arc::new(GeminiImageBackend::new(GeminiConfig {
            api_key: config.google.api_key.clone(),
        }));

        tracing::info!(
            model = %config.models.image_model,
            "Initialized Gemini image backend"
        );

        Self::build_with_backend(config, backend).await
    }

    /// Build the application against an injected backend. Tests use this to
    /// substitute a stub for the hosted API.
    pub async fn build_with_backend(
        config: ImagegenConfig,
        backend: Arc<dyn ImageBackend>,
    ) -> Result<Self, AppError> {
        let state = AppState {
            gateway: BackendGateway::new(backend.clone()),
            sessions: Arc::new(SessionRegistry::new()),
            backend,
            config: config.clone(),
        };

        // Port 0 = random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("imagegen service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        if let Some(secs) = self.state.config.sessions.idle_timeout_secs.filter(|s| *s > 0) {
            spawn_idle_sweeper(self.state.sessions.clone(), Duration::from_secs(secs));
        }

        let router = build_router(self.state);
        axum::serve(self.listener, router).await
    }
}

/// Periodic idle-session sweep. Only started when an idle timeout is
/// explicitly configured; the default matches the original's unbounded
/// retention.
fn spawn_idle_sweeper(sessions: Arc<SessionRegistry>, max_idle: Duration) {
    tracing::info!(max_idle_secs = max_idle.as_secs(), "Idle session sweep enabled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(max_idle);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sessions.sweep_idle(max_idle);
        }
    });
}

fn build_router(state: AppState) -> Router {
    let secret = BearerSecret::new(state.config.google.api_key.clone());

    // Room for a few full-size uploads per multipart request; the per-part
    // ceiling is enforced during form collection.
    let body_limit = state.config.limits.max_upload_bytes * 4;

    let api = Router::new()
        .route("/generate-image", post(handlers::images::generate_image))
        .route("/edit-image", post(handlers::images::edit_image))
        .route("/compose-images", post(handlers::images::compose_images))
        .route("/chat/create", post(handlers::chat::create_chat))
        .route(
            "/chat/:session_id",
            get(handlers::chat::get_chat).delete(handlers::chat::clear_chat),
        )
        .route(
            "/chat/:session_id/message",
            post(handlers::chat::send_chat_message),
        )
        .route("/story/generate", post(handlers::story::generate_story))
        .route("/advanced/inpaint", post(handlers::advanced::inpaint_image))
        .route(
            "/advanced/outpaint",
            post(handlers::advanced::outpaint_image),
        )
        .route(
            "/advanced/style-transfer",
            post(handlers::advanced::style_transfer),
        )
        .layer(axum::middleware::from_fn_with_state(secret, require_bearer));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
