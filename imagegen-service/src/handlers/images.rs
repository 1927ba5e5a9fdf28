use crate::dtos::images::{
    ComposeImagesForm, CompositionStyle, EditImageForm, GenerateImageRequest,
    ImageGenerationResponse,
};
use crate::handlers::forms::{parse_bool, parse_f32, FormData};
use crate::media;
use crate::services::backend::GenerationOptions;
use crate::services::normalize;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let model = request
        .model
        .clone()
        .unwrap_or_else(|| state.config.models.image_model.clone());
    let options = GenerationOptions {
        temperature: request.temperature,
        top_k: request.top_k,
        top_p: request.top_p,
        response_modalities: request.response_modalities.clone(),
    };

    let call = normalize::generate(&request.prompt, &model, options);
    let result = state.gateway.call(&call).await?;

    tracing::info!(
        prompt_len = request.prompt.len(),
        images = result.images.len(),
        "Image generation completed"
    );

    Ok(Json(ImageGenerationResponse::from_result(&result, &model)?))
}

pub async fn edit_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let limits = &state.config.limits;
    let form = FormData::read(multipart, limits.max_upload_bytes, limits.max_prompt_chars).await?;

    let fields = EditImageForm {
        prompt: form.require_text("prompt")?.to_string(),
        preserve_subject: form
            .text("preserve_subject")
            .map(|v| parse_bool("preserve_subject", v))
            .transpose()?
            .unwrap_or(true),
        edit_strength: form
            .text("edit_strength")
            .map(|v| parse_f32("edit_strength", v))
            .transpose()?
            .unwrap_or(0.8),
    };
    fields.validate()?;

    let image = media::decode(form.require_image("image")?)?;
    let model = form
        .text("model")
        .unwrap_or(&state.config.models.image_model)
        .to_string();

    let call = normalize::edit(&fields.prompt, fields.preserve_subject, image, &model);
    let result = state.gateway.call(&call).await?;

    Ok(Json(ImageGenerationResponse::from_result(&result, &model)?))
}

pub async fn compose_images(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let limits = &state.config.limits;
    let form = FormData::read(multipart, limits.max_upload_bytes, limits.max_prompt_chars).await?;

    let fields = ComposeImagesForm {
        prompt: form.require_text("prompt")?.to_string(),
        composition_style: form
            .text("composition_style")
            .map(CompositionStyle::parse)
            .transpose()?
            .unwrap_or(CompositionStyle::Blend),
    };
    fields.validate()?;

    let images = form
        .images_named("images")
        .into_iter()
        .map(media::decode)
        .collect::<Result<Vec<_>, _>>()?;
    let model = form
        .text("model")
        .unwrap_or(&state.config.models.image_model)
        .to_string();

    let call = normalize::compose(&fields.prompt, fields.composition_style, images, &model)?;
    let result = state.gateway.call(&call).await?;

    tracing::info!(
        source_images = call.attachments.len(),
        images = result.images.len(),
        "Image composition completed"
    );

    Ok(Json(ImageGenerationResponse::from_result(&result, &model)?))
}
