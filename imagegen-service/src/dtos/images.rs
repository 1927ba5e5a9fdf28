use crate::media;
use crate::services::backend::ResponseModality;
use crate::services::gateway::{GenerationResult, TokenEstimate};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateImageRequest {
    #[validate(length(min = 10, max = 2000, message = "Prompt must be 10-2000 characters"))]
    pub prompt: String,

    pub model: Option<String>,

    #[serde(default = "default_modalities")]
    pub response_modalities: Vec<ResponseModality>,

    #[validate(range(min = 0.0, max = 2.0, message = "temperature must be within [0, 2]"))]
    pub temperature: Option<f32>,

    #[validate(range(min = 1, max = 100, message = "top_k must be within [1, 100]"))]
    pub top_k: Option<i32>,

    #[validate(range(min = 0.0, max = 1.0, message = "top_p must be within [0, 1]"))]
    pub top_p: Option<f32>,
}

fn default_modalities() -> Vec<ResponseModality> {
    vec![ResponseModality::Text, ResponseModality::Image]
}

/// Multipart field set for /edit-image, validated after collection.
#[derive(Debug, Validate)]
pub struct EditImageForm {
    #[validate(length(min = 5, max = 1000, message = "Prompt must be 5-1000 characters"))]
    pub prompt: String,
    pub preserve_subject: bool,
    #[validate(range(min = 0.1, max = 1.0, message = "edit_strength must be within [0.1, 1]"))]
    pub edit_strength: f32,
}

/// Multipart field set for /compose-images.
#[derive(Debug, Validate)]
pub struct ComposeImagesForm {
    #[validate(length(min = 10, max = 1000, message = "Prompt must be 10-1000 characters"))]
    pub prompt: String,
    pub composition_style: CompositionStyle,
}

/// Multipart field set for /advanced/inpaint.
#[derive(Debug, Validate)]
pub struct InpaintForm {
    #[validate(length(min = 1, max = 2000, message = "Prompt must be 1-2000 characters"))]
    pub prompt: String,
    pub region_description: Option<String>,
}

/// Multipart field set for /advanced/outpaint.
#[derive(Debug, Validate)]
pub struct OutpaintForm {
    #[validate(length(min = 1, max = 2000, message = "Prompt must be 1-2000 characters"))]
    pub prompt: String,
    pub directions: Vec<Direction>,
    #[validate(range(min = 0.1, max = 2.0, message = "extension_ratio must be within [0.1, 2]"))]
    pub extension_ratio: f32,
}

/// Multipart field set for /advanced/style-transfer.
#[derive(Debug, Validate)]
pub struct StyleTransferForm {
    pub style: Option<StyleType>,
    #[validate(range(min = 0.1, max = 1.0, message = "style_strength must be within [0.1, 1]"))]
    pub style_strength: f32,
    pub preserve_content: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionStyle {
    Blend,
    Replace,
    Overlay,
    Montage,
}

impl CompositionStyle {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "blend" => Ok(Self::Blend),
            "replace" => Ok(Self::Replace),
            "overlay" => Ok(Self::Overlay),
            "montage" => Ok(Self::Montage),
            other => Err(AppError::BadRequest(anyhow::anyhow!(
                "Unknown composition style: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleType {
    VanGogh,
    Picasso,
    Monet,
    DigitalArt,
    Anime,
    OilPainting,
    Watercolor,
    Photographic,
    Minimalist,
    Abstract,
}

impl StyleType {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "van_gogh" => Ok(Self::VanGogh),
            "picasso" => Ok(Self::Picasso),
            "monet" => Ok(Self::Monet),
            "digital_art" => Ok(Self::DigitalArt),
            "anime" => Ok(Self::Anime),
            "oil_painting" => Ok(Self::OilPainting),
            "watercolor" => Ok(Self::Watercolor),
            "photographic" => Ok(Self::Photographic),
            "minimalist" => Ok(Self::Minimalist),
            "abstract" => Ok(Self::Abstract),
            other => Err(AppError::BadRequest(anyhow::anyhow!(
                "Unknown style: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
    All,
}

impl Direction {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "all" => Ok(Self::All),
            other => Err(AppError::BadRequest(anyhow::anyhow!(
                "Unknown direction: {}",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
pub struct ImageMetadata {
    pub model: String,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub total_tokens: i32,
    /// Token counts are placeholders, never measured.
    pub tokens_estimated: bool,
    pub generation_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,
}

impl ImageMetadata {
    fn new(model: &str, tokens: TokenEstimate, elapsed: f64, dims: Option<ImageDimensions>) -> Self {
        Self {
            model: model.to_string(),
            prompt_tokens: tokens.prompt,
            completion_tokens: tokens.completion,
            total_tokens: tokens.total,
            tokens_estimated: true,
            generation_time: elapsed,
            image_dimensions: dims,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageGenerationResponse {
    pub text: Vec<String>,
    /// Base64-encoded PNG images.
    pub images: Vec<String>,
    pub metadata: ImageMetadata,
}

impl ImageGenerationResponse {
    pub fn from_result(result: &GenerationResult, model: &str) -> Result<Self, AppError> {
        let dims = result.images.first().map(|image| ImageDimensions {
            width: image.width(),
            height: image.height(),
        });

        let images = result
            .images
            .iter()
            .map(media::to_base64)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            text: result.text_fragments.clone(),
            images,
            metadata: ImageMetadata::new(model, result.token_estimate, result.elapsed_seconds, dims),
        })
    }
}
