//! Gemini image backend.
//!
//! Calls the generateContent endpoint with interleaved text and inline image
//! parts. Conversation history is replayed from the handle on every turn, so
//! callers never manage prior context themselves.

use super::{
    BackendError, Conversation, Fragment, GenerationOptions, GenerationRequest, ImageBackend, Role,
};
use crate::media;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini backend configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
}

pub struct GeminiImageBackend {
    config: GeminiConfig,
    client: Client,
}

impl GeminiImageBackend {
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            GEMINI_API_BASE, model, method, self.config.api_key
        )
    }

    fn build_generation_config(options: &GenerationOptions) -> GenerationConfig {
        GenerationConfig {
            temperature: options.temperature,
            top_k: options.top_k,
            top_p: options.top_p,
            response_modalities: if options.response_modalities.is_empty() {
                None
            } else {
                Some(
                    options
                        .response_modalities
                        .iter()
                        .map(|m| m.as_str().to_string())
                        .collect(),
                )
            },
        }
    }

    /// Convert a canonical request into user-content parts: the instruction
    /// first, then each attachment as inline PNG data.
    fn request_parts(request: &GenerationRequest) -> Result<Vec<Part>, BackendError> {
        let mut parts = vec![Part::Text {
            text: request.instruction.clone(),
        }];
        for attachment in &request.attachments {
            let png =
                media::encode_png(attachment).map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: "image/png".to_string(),
                    data: BASE64.encode(png),
                },
            });
        }
        Ok(parts)
    }

    fn fragment_parts(fragments: &[Fragment]) -> Vec<Part> {
        fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Text(text) => Part::Text { text: text.clone() },
                Fragment::Inline { mime_type, data } => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: BASE64.encode(data),
                    },
                },
            })
            .collect()
    }

    fn history_contents(conversation: &Conversation) -> Vec<Content> {
        conversation
            .turns()
            .iter()
            .map(|turn| Content {
                role: Some(
                    match turn.role {
                        Role::User => "user",
                        Role::Model => "model",
                    }
                    .to_string(),
                ),
                parts: Self::fragment_parts(&turn.fragments),
            })
            .collect()
    }

    async fn exchange(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<Vec<Fragment>, BackendError> {
        let url = self.api_url(model, "generateContent");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        Self::parse_fragments(api_response)
    }

    /// Extract fragments from the first candidate, in arrival order. Parts
    /// matching neither text nor inline data are ignored.
    fn parse_fragments(response: GenerateContentResponse) -> Result<Vec<Fragment>, BackendError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::MalformedResponse("response has no candidates".into()))?;

        let mut fragments = Vec::new();
        for part in candidate.content.parts {
            match part {
                Part::Text { text } => {
                    if !text.is_empty() {
                        fragments.push(Fragment::Text(text));
                    }
                }
                Part::InlineData { inline_data } => {
                    let data = BASE64.decode(&inline_data.data).map_err(|e| {
                        BackendError::MalformedResponse(format!("invalid inline data: {}", e))
                    })?;
                    fragments.push(Fragment::Inline {
                        mime_type: inline_data.mime_type,
                        data,
                    });
                }
                Part::Other(_) => {}
            }
        }
        Ok(fragments)
    }
}

#[async_trait]
impl ImageBackend for GeminiImageBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Fragment>, BackendError> {
        let parts = Self::request_parts(request)?;
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: None,
            generation_config: Some(Self::build_generation_config(&request.options)),
        };

        tracing::debug!(
            model = %request.model,
            prompt_len = request.instruction.len(),
            attachment_count = request.attachments.len(),
            "Sending request to Gemini API"
        );

        self.exchange(&request.model, body).await
    }

    async fn open_conversation(
        &self,
        model: &str,
        system_instruction: Option<&str>,
    ) -> Result<Conversation, BackendError> {
        if self.config.api_key.is_empty() {
            return Err(BackendError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }
        Ok(Conversation::new(model, system_instruction.map(String::from)))
    }

    async fn converse(
        &self,
        conversation: &mut Conversation,
        request: &GenerationRequest,
    ) -> Result<Vec<Fragment>, BackendError> {
        let user_parts = Self::request_parts(request)?;

        let mut contents = Self::history_contents(conversation);
        contents.push(Content {
            role: Some("user".to_string()),
            parts: user_parts,
        });

        let body = GenerateContentRequest {
            contents,
            system_instruction: conversation.system_instruction().map(|text| Content {
                role: None,
                parts: vec![Part::Text {
                    text: text.to_string(),
                }],
            }),
            generation_config: Some(Self::build_generation_config(&request.options)),
        };

        tracing::debug!(
            model = %conversation.model(),
            turn_count = conversation.turns().len(),
            prompt_len = request.instruction.len(),
            "Sending conversation turn to Gemini API"
        );

        let fragments = self.exchange(conversation.model(), body).await?;

        // Thread state through the handle only after a successful exchange.
        let mut user_fragments = vec![Fragment::Text(request.instruction.clone())];
        for attachment in &request.attachments {
            let png =
                media::encode_png(attachment).map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
            user_fragments.push(Fragment::Inline {
                mime_type: "image/png".to_string(),
                data: png,
            });
        }
        conversation.push_turn(Role::User, user_fragments);
        conversation.push_turn(Role::Model, fragments.clone());

        Ok(fragments)
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(alias = "inlineData")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,
}
