use crate::dtos::story::{
    StoryGenerationRequest, StoryGenerationResponse, StoryImageResponse, StoryMetadata,
};
use crate::media;
use crate::services::story;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;
use validator::Validate;

pub async fn generate_story(
    State(state): State<AppState>,
    Json(request): Json<StoryGenerationRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let limits = &state.config.limits;
    if request.num_images < limits.min_story_images || request.num_images > limits.max_story_images
    {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "num_images must be between {} and {}",
            limits.min_story_images,
            limits.max_story_images
        )));
    }

    let model = request
        .model
        .clone()
        .unwrap_or_else(|| state.config.models.image_model.clone());

    let outcome = story::generate_sequence(
        &state.gateway,
        &request.description,
        request.num_images,
        request.style.as_deref(),
        &model,
    )
    .await?;

    tracing::info!(
        requested = request.num_images,
        produced = outcome.items.len(),
        "Story generation completed"
    );

    let images = outcome
        .items
        .iter()
        .map(|item| {
            Ok(StoryImageResponse {
                image: media::to_base64(&item.image)?,
                sequence_number: item.sequence_number,
                description: item.caption.clone(),
                timestamp: item.timestamp,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(StoryGenerationResponse {
        images,
        story_metadata: StoryMetadata {
            total_images: outcome.items.len(),
            content_type: request.content_type,
            generation_time: outcome.elapsed_seconds,
            total_tokens: outcome.total_token_estimate,
            tokens_estimated: true,
        },
    }))
}
