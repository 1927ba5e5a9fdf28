//! Multipart form collection.
//!
//! Drains a multipart stream into named text fields and raw image parts.
//! Image parts are guarded before any decode: declared content type must be
//! an image, and the received byte length must stay under the configured
//! ceiling.

use axum::extract::Multipart;
use service_core::error::AppError;

pub struct FormData {
    fields: Vec<(String, String)>,
    images: Vec<(String, Vec<u8>)>,
}

impl FormData {
    pub async fn read(
        mut multipart: Multipart,
        max_image_bytes: usize,
        max_text_chars: usize,
    ) -> Result<Self, AppError> {
        let mut fields = Vec::new();
        let mut images = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })? {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_some() {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.starts_with("image/") {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "File must be an image"
                    )));
                }

                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
                })?;
                if data.len() > max_image_bytes {
                    return Err(AppError::PayloadTooLarge(format!(
                        "File too large. Maximum size is {} bytes",
                        max_image_bytes
                    )));
                }
                images.push((name, data.to_vec()));
            } else {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read text field: {}", e))
                })?;
                if text.chars().count() > max_text_chars {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "Field '{}' exceeds {} characters",
                        name,
                        max_text_chars
                    )));
                }
                fields.push((name, text));
            }
        }

        Ok(Self { fields, images })
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// All values of a repeated text field, in arrival order.
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn require_text(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing field '{}'", name)))
    }

    pub fn image(&self, name: &str) -> Option<&[u8]> {
        self.images
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, data)| data.as_slice())
    }

    /// All parts uploaded under a repeated file field, in arrival order.
    pub fn images_named(&self, name: &str) -> Vec<&[u8]> {
        self.images
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, data)| data.as_slice())
            .collect()
    }

    pub fn require_image(&self, name: &str) -> Result<&[u8], AppError> {
        self.image(name)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing image '{}'", name)))
    }
}

pub fn parse_bool(name: &str, value: &str) -> Result<bool, AppError> {
    match value {
        "true" | "True" | "1" => Ok(true),
        "false" | "False" | "0" => Ok(false),
        _ => Err(AppError::BadRequest(anyhow::anyhow!(
            "Field '{}' must be a boolean",
            name
        ))),
    }
}

pub fn parse_f32(name: &str, value: &str) -> Result<f32, AppError> {
    value
        .parse()
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Field '{}' must be a number", name)))
}
