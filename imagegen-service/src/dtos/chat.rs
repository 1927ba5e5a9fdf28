use crate::services::sessions::SessionSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatCreateRequest {
    pub model: Option<String>,

    #[validate(length(max = 2000, message = "System prompt must be at most 2000 characters"))]
    pub system_prompt: Option<String>,
}

/// Multipart field set for /chat/{id}/message.
#[derive(Debug, Validate)]
pub struct ChatMessageForm {
    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatSessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub message_count: u64,
    /// Sum of submitted message lengths, not an actual token count.
    pub context_length: u64,
}

impl From<SessionSummary> for ChatSessionResponse {
    fn from(summary: SessionSummary) -> Self {
        Self {
            session_id: summary.id,
            created_at: summary.created_at,
            model: summary.model,
            message_count: summary.message_count,
            context_length: summary.context_length_estimate,
        }
    }
}
