//! Newsletter signup handler.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;
use whiskers_core::inbox::SubscribeInput;

use super::{ApiResponse, Empty};
use crate::error::Result;
use crate::extract::ApiJson;
use crate::state::AppState;

/// `POST /api/v1/subscribers`
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SubscribeInput>,
) -> Result<(StatusCode, Json<ApiResponse<Empty>>)> {
    let email = input.validate()?;
    let subscriber = state.store().insert_subscriber(&email).await?;

    tracing::info!(subscriber_id = %subscriber.id, "Newsletter subscription added");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Successfully subscribed!", Empty {})),
    ))
}
