//! Process-wide chat session registry.
//!
//! Each session exclusively owns one backend conversation handle. Access to a
//! session is serialized through a per-session mutex so concurrent sends
//! cannot race on the counters or on the handle itself. Sessions live until
//! an explicit clear or process exit; an idle sweep exists but only runs when
//! explicitly configured.

use crate::services::backend::{GenerationRequest, ImageBackend};
use crate::services::gateway::{BackendGateway, GenerationResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::backend::Conversation;

/// Point-in-time view of a session's counters.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub message_count: u64,
    pub context_length_estimate: u64,
}

struct SessionState {
    model: String,
    created_at: DateTime<Utc>,
    message_count: u64,
    context_length_estimate: u64,
    last_activity: DateTime<Utc>,
    conversation: Conversation,
}

impl SessionState {
    fn summary(&self, id: &str) -> SessionSummary {
        SessionSummary {
            id: id.to_string(),
            model: self.model.clone(),
            created_at: self.created_at,
            message_count: self.message_count,
            context_length_estimate: self.context_length_estimate,
        }
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<SessionState>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a conversation handle and register a fresh session around it.
    /// Nothing is stored if conversation creation fails.
    pub async fn create(
        &self,
        backend: &dyn ImageBackend,
        model: &str,
        system_instruction: Option<&str>,
    ) -> Result<SessionSummary, AppError> {
        let conversation = backend.open_conversation(model, system_instruction).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let state = SessionState {
            model: model.to_string(),
            created_at: now,
            message_count: 0,
            context_length_estimate: 0,
            last_activity: now,
            conversation,
        };
        let summary = state.summary(&id);

        self.sessions.insert(id.clone(), Arc::new(Mutex::new(state)));

        tracing::info!(session_id = %id, model = %model, "Chat session created");
        Ok(summary)
    }

    pub async fn get(&self, id: &str) -> Result<SessionSummary, AppError> {
        let entry = self.lookup(id)?;
        let state = entry.lock().await;
        Ok(state.summary(id))
    }

    /// Send one message within a session. The per-session lock serializes
    /// concurrent sends against the same id.
    pub async fn send(
        &self,
        gateway: &BackendGateway,
        id: &str,
        request: GenerationRequest,
    ) -> Result<GenerationResult, AppError> {
        let entry = self.lookup(id)?;
        let mut state = entry.lock().await;

        // The session may have been cleared while waiting on the lock.
        if !self.sessions.contains_key(id) {
            return Err(not_found(id));
        }

        let message_chars = request.instruction.chars().count() as u64;
        let result = gateway.converse(&mut state.conversation, &request).await?;

        state.message_count += 1;
        state.context_length_estimate += message_chars;
        state.last_activity = Utc::now();

        tracing::info!(
            session_id = %id,
            message_count = state.message_count,
            "Chat message processed"
        );

        Ok(result)
    }

    /// Remove a session. The conversation handle is dropped, not actively
    /// torn down on the backend side.
    pub fn clear(&self, id: &str) -> Result<(), AppError> {
        match self.sessions.remove(id) {
            Some(_) => {
                tracing::info!(session_id = %id, "Chat session cleared");
                Ok(())
            }
            None => Err(not_found(id)),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove sessions idle longer than `max_idle`. Sessions with a send in
    /// flight hold their lock and are left alone. Returns the removed count.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(max_idle).unwrap_or_else(|_| chrono::Duration::zero());
        let before = self.sessions.len();

        self.sessions.retain(|_, state| match state.try_lock() {
            Ok(state) => state.last_activity >= cutoff,
            Err(_) => true,
        });

        let removed = before - self.sessions.len();
        if removed > 0 {
            tracing::info!(removed, "Idle chat sessions swept");
        }
        removed
    }

    fn lookup(&self, id: &str) -> Result<Arc<Mutex<SessionState>>, AppError> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Chat session not found: {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::mock::MockImageBackend;
    use crate::services::backend::{BackendError, Fragment, GenerationOptions};
    use crate::services::normalize;

    fn mock() -> Arc<MockImageBackend> {
        Arc::new(MockImageBackend::returning(vec![Fragment::Text(
            "done".to_string(),
        )]))
    }

    fn message(text: &str) -> GenerationRequest {
        GenerationRequest {
            instruction: text.to_string(),
            attachments: Vec::new(),
            model: "test-model".to_string(),
            options: GenerationOptions::default(),
        }
    }

    #[tokio::test]
    async fn sessions_are_isolated_and_counted() {
        let backend = mock();
        let gateway = BackendGateway::new(backend.clone());
        let registry = SessionRegistry::new();

        let first = registry
            .create(backend.as_ref(), "test-model", None)
            .await
            .unwrap();
        let second = registry
            .create(backend.as_ref(), "test-model", None)
            .await
            .unwrap();
        assert_ne!(first.id, second.id);

        registry
            .send(&gateway, &first.id, message("draw a cat"))
            .await
            .unwrap();

        let first_summary = registry.get(&first.id).await.unwrap();
        assert_eq!(first_summary.message_count, 1);
        assert_eq!(first_summary.context_length_estimate, "draw a cat".len() as u64);

        let second_summary = registry.get(&second.id).await.unwrap();
        assert_eq!(second_summary.message_count, 0);
    }

    #[tokio::test]
    async fn cleared_sessions_are_gone() {
        let backend = mock();
        let gateway = BackendGateway::new(backend.clone());
        let registry = SessionRegistry::new();

        let session = registry
            .create(backend.as_ref(), "test-model", None)
            .await
            .unwrap();
        registry.clear(&session.id).unwrap();

        assert!(matches!(
            registry.get(&session.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            registry
                .send(&gateway, &session.id, message("hello"))
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            registry.clear(&session.id).unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn failed_conversation_creation_leaves_no_session() {
        let backend = mock();
        backend.enqueue(Err(BackendError::Api("unavailable".to_string())));
        let registry = SessionRegistry::new();

        let err = registry
            .create(backend.as_ref(), "test-model", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BackendError(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn failed_send_does_not_bump_counters() {
        let backend = mock();
        let gateway = BackendGateway::new(backend.clone());
        let registry = SessionRegistry::new();

        let session = registry
            .create(backend.as_ref(), "test-model", None)
            .await
            .unwrap();
        backend.enqueue(Err(BackendError::Network("timeout".to_string())));

        let err = registry
            .send(&gateway, &session.id, message("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BackendError(_)));

        let summary = registry.get(&session.id).await.unwrap();
        assert_eq!(summary.message_count, 0);
        assert_eq!(summary.context_length_estimate, 0);
    }

    #[tokio::test]
    async fn idle_sweep_removes_only_stale_sessions() {
        let backend = mock();
        let registry = SessionRegistry::new();

        let session = registry
            .create(backend.as_ref(), "test-model", None)
            .await
            .unwrap();

        assert_eq!(registry.sweep_idle(Duration::from_secs(3600)), 0);
        assert_eq!(registry.sweep_idle(Duration::from_secs(0)), 1);
        assert!(matches!(
            registry.get(&session.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn chat_requests_reach_the_conversation() {
        let backend = mock();
        let gateway = BackendGateway::new(backend.clone());
        let registry = SessionRegistry::new();

        let session = registry
            .create(backend.as_ref(), "test-model", None)
            .await
            .unwrap();
        let request = normalize::chat_message("make the sky darker", None, "test-model");
        registry.send(&gateway, &session.id, request).await.unwrap();

        assert_eq!(
            backend.recorded_instructions(),
            vec!["make the sky darker".to_string()]
        );
    }
}
