//! Contact form handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;
use whiskers_core::inbox::{Message, MessageInput};

use super::ApiResponse;
use crate::error::Result;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageBody {
    data: Message,
}

/// `POST /api/v1/messages`
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MessageInput>,
) -> Result<(StatusCode, Json<ApiResponse<MessageBody>>)> {
    let message = input.validate()?;
    let data = state.store().insert_message(message).await?;

    tracing::info!(message_id = %data.id, subject = %data.subject, "Contact message received");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Your message has been sent successfully!",
            MessageBody { data },
        )),
    ))
}
