use crate::dtos::chat::{ChatCreateRequest, ChatMessageForm, ChatSessionResponse};
use crate::dtos::images::ImageGenerationResponse;
use crate::handlers::forms::FormData;
use crate::media;
use crate::services::normalize;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn create_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let model = request
        .model
        .clone()
        .unwrap_or_else(|| state.config.models.image_model.clone());

    let summary = state
        .sessions
        .create(
            state.backend.as_ref(),
            &model,
            request.system_prompt.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ChatSessionResponse::from(summary)),
    ))
}

pub async fn get_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.sessions.get(&session_id).await?;
    Ok(Json(ChatSessionResponse::from(summary)))
}

pub async fn send_chat_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let limits = &state.config.limits;
    let form = FormData::read(multipart, limits.max_upload_bytes, limits.max_prompt_chars).await?;

    let fields = ChatMessageForm {
        message: form.require_text("message")?.to_string(),
    };
    fields.validate()?;

    let image = form.image("image").map(media::decode).transpose()?;

    let summary = state.sessions.get(&session_id).await?;
    let call = normalize::chat_message(&fields.message, image, &summary.model);
    let result = state.sessions.send(&state.gateway, &session_id, call).await?;

    Ok(Json(ImageGenerationResponse::from_result(
        &result,
        &summary.model,
    )?))
}

pub async fn clear_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.clear(&session_id)?;
    Ok(StatusCode::NO_CONTENT)
}
