//! Backend gateway: the single outbound call contract.
//!
//! Issues one request against the generative backend and reshapes the
//! heterogeneous fragment stream into a uniform result record. Text fragments
//! keep arrival order; inline media is decoded through the media codec.

use crate::media;
use crate::services::backend::{
    Conversation, Fragment, GenerationRequest, ImageBackend,
};
use image::RgbImage;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;

/// Token usage placeholder attached to every call. The hosted API does not
/// report usage for image generation, so these are estimates, not telemetry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TokenEstimate {
    pub prompt: i32,
    pub completion: i32,
    pub total: i32,
}

pub const TOKENS_PER_CALL: TokenEstimate = TokenEstimate {
    prompt: 45,
    completion: 1290,
    total: 1335,
};

/// Uniform result of one backend call. Never mutated after construction.
#[derive(Debug)]
pub struct GenerationResult {
    pub text_fragments: Vec<String>,
    pub images: Vec<RgbImage>,
    pub token_estimate: TokenEstimate,
    pub elapsed_seconds: f64,
}

#[derive(Clone)]
pub struct BackendGateway {
    backend: Arc<dyn ImageBackend>,
}

impl BackendGateway {
    pub fn new(backend: Arc<dyn ImageBackend>) -> Self {
        Self { backend }
    }

    /// One stateless request-response exchange.
    pub async fn call(&self, request: &GenerationRequest) -> Result<GenerationResult, AppError> {
        let started = Instant::now();
        let fragments = self.backend.generate(request).await?;
        let result = Self::assemble(fragments, started)?;

        tracing::info!(
            model = %request.model,
            text_fragments = result.text_fragments.len(),
            images = result.images.len(),
            elapsed_seconds = result.elapsed_seconds,
            "Backend call completed"
        );

        Ok(result)
    }

    /// One exchange within an existing conversation handle.
    pub async fn converse(
        &self,
        conversation: &mut Conversation,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, AppError> {
        let started = Instant::now();
        let fragments = self.backend.converse(conversation, request).await?;
        Self::assemble(fragments, started)
    }

    /// Partition fragments by kind, preserving arrival order within each
    /// kind. Inline media that fails to decode is a backend fault, not a
    /// client one.
    fn assemble(fragments: Vec<Fragment>, started: Instant) -> Result<GenerationResult, AppError> {
        let mut text_fragments = Vec::new();
        let mut images = Vec::new();

        for fragment in fragments {
            match fragment {
                Fragment::Text(text) => text_fragments.push(text),
                Fragment::Inline { data, .. } => {
                    let image = media::decode(&data).map_err(|e| {
                        AppError::BackendError(format!("backend returned undecodable image: {}", e))
                    })?;
                    images.push(image);
                }
            }
        }

        Ok(GenerationResult {
            text_fragments,
            images,
            token_estimate: TOKENS_PER_CALL,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        })
    }
}
