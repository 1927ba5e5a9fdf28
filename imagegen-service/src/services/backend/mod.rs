//! Generative backend abstractions and implementations.
//!
//! This module provides a trait-based abstraction over the hosted image
//! model, allowing easy swapping between backends (Gemini, mock).

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use thiserror::Error;

/// Error type for backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::BackendError(err.to_string())
    }
}

/// One atomic unit of a backend response: a text span or an inline media
/// blob. Wire parts matching neither kind are dropped at decode.
#[derive(Debug, Clone)]
pub enum Fragment {
    Text(String),
    Inline { mime_type: String, data: Vec<u8> },
}

/// Response kinds the backend is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseModality {
    Text,
    Image,
}

impl ResponseModality {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseModality::Text => "Text",
            ResponseModality::Image => "Image",
        }
    }
}

/// Generation parameters forwarded to the backend.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Top-k sampling (1 - 100).
    pub top_k: Option<i32>,

    /// Nucleus sampling threshold (0.0 - 1.0).
    pub top_p: Option<f32>,

    /// Requested response kinds.
    pub response_modalities: Vec<ResponseModality>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: None,
            top_k: None,
            top_p: None,
            response_modalities: vec![ResponseModality::Text, ResponseModality::Image],
        }
    }
}

/// The canonical call shape every operation kind reduces to. Immutable once
/// constructed; one instance per backend call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub instruction: String,
    pub attachments: Vec<RgbImage>,
    pub model: String,
    pub options: GenerationOptions,
}

/// Speaker of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug)]
pub struct Turn {
    pub role: Role,
    pub fragments: Vec<Fragment>,
}

/// Opaque multi-turn conversation handle. History lives here and is threaded
/// through each call by the backend implementation; callers never resend
/// prior turns. Exclusively owned by one session.
#[derive(Debug)]
pub struct Conversation {
    model: String,
    system_instruction: Option<String>,
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(model: impl Into<String>, system_instruction: Option<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction,
            turns: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn push_turn(&mut self, role: Role, fragments: Vec<Fragment>) {
        self.turns.push(Turn { role, fragments });
    }
}

/// Trait for generative image backends.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Issue one stateless request-response exchange.
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Fragment>, BackendError>;

    /// Open a fresh conversation handle bound to one model.
    async fn open_conversation(
        &self,
        model: &str,
        system_instruction: Option<&str>,
    ) -> Result<Conversation, BackendError>;

    /// Issue one exchange within a conversation, appending both the user turn
    /// and the model reply to the handle on success.
    async fn converse(
        &self,
        conversation: &mut Conversation,
        request: &GenerationRequest,
    ) -> Result<Vec<Fragment>, BackendError>;
}
