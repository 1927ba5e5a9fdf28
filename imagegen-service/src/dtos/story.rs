use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct StoryGenerationRequest {
    #[validate(length(min = 20, max = 2000, message = "Description must be 20-2000 characters"))]
    pub description: String,

    /// Number of images in the sequence; bounds come from configuration.
    pub num_images: u32,

    #[serde(default)]
    pub content_type: ContentType,

    pub style: Option<String>,

    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Story,
    Recipe,
    Tutorial,
    Comic,
    Custom,
}

#[derive(Debug, Serialize)]
pub struct StoryImageResponse {
    /// Base64-encoded PNG image.
    pub image: String,
    pub sequence_number: u32,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StoryMetadata {
    pub total_images: usize,
    pub content_type: ContentType,
    pub generation_time: f64,
    pub total_tokens: i64,
    /// Token counts are placeholders, never measured.
    pub tokens_estimated: bool,
}

#[derive(Debug, Serialize)]
pub struct StoryGenerationResponse {
    pub images: Vec<StoryImageResponse>,
    pub story_metadata: StoryMetadata,
}
