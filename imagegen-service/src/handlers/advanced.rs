use crate::dtos::images::{
    Direction, ImageGenerationResponse, InpaintForm, OutpaintForm, StyleTransferForm, StyleType,
};
use crate::handlers::forms::{parse_bool, parse_f32, FormData};
use crate::media;
use crate::services::normalize;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn inpaint_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let limits = &state.config.limits;
    let form = FormData::read(multipart, limits.max_upload_bytes, limits.max_prompt_chars).await?;

    let fields = InpaintForm {
        prompt: form.require_text("prompt")?.to_string(),
        region_description: form.text("region_description").map(str::to_string),
    };
    fields.validate()?;

    let image = media::decode(form.require_image("image")?)?;
    let model = form
        .text("model")
        .unwrap_or(&state.config.models.image_model)
        .to_string();

    let call = normalize::inpaint(
        &fields.prompt,
        fields.region_description.as_deref(),
        image,
        &model,
    );
    let result = state.gateway.call(&call).await?;

    Ok(Json(ImageGenerationResponse::from_result(&result, &model)?))
}

pub async fn outpaint_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let limits = &state.config.limits;
    let form = FormData::read(multipart, limits.max_upload_bytes, limits.max_prompt_chars).await?;

    let fields = OutpaintForm {
        prompt: form.require_text("prompt")?.to_string(),
        directions: form
            .texts("direction")
            .into_iter()
            .map(Direction::parse)
            .collect::<Result<Vec<_>, _>>()?,
        extension_ratio: form
            .text("extension_ratio")
            .map(|v| parse_f32("extension_ratio", v))
            .transpose()?
            .unwrap_or(0.5),
    };
    fields.validate()?;

    let image = media::decode(form.require_image("image")?)?;
    let model = form
        .text("model")
        .unwrap_or(&state.config.models.image_model)
        .to_string();

    let call = normalize::outpaint(
        &fields.prompt,
        &fields.directions,
        fields.extension_ratio,
        image,
        &model,
    )?;
    let result = state.gateway.call(&call).await?;

    Ok(Json(ImageGenerationResponse::from_result(&result, &model)?))
}

pub async fn style_transfer(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let limits = &state.config.limits;
    let form = FormData::read(multipart, limits.max_upload_bytes, limits.max_prompt_chars).await?;

    let fields = StyleTransferForm {
        style: form.text("style").map(StyleType::parse).transpose()?,
        style_strength: form
            .text("style_strength")
            .map(|v| parse_f32("style_strength", v))
            .transpose()?
            .unwrap_or(0.8),
        preserve_content: form
            .text("preserve_content")
            .map(|v| parse_bool("preserve_content", v))
            .transpose()?
            .unwrap_or(true),
    };
    fields.validate()?;

    let image = media::decode(form.require_image("image")?)?;
    let reference = form
        .image("style_reference_image")
        .map(media::decode)
        .transpose()?;
    let model = form
        .text("model")
        .unwrap_or(&state.config.models.image_model)
        .to_string();

    let call = normalize::style_transfer(
        fields.style,
        reference,
        fields.style_strength,
        fields.preserve_content,
        image,
        &model,
    )?;
    let result = state.gateway.call(&call).await?;

    Ok(Json(ImageGenerationResponse::from_result(&result, &model)?))
}
