//! Image upload handlers.

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiResponse, Empty};
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::services::images::{ImageUpload, MAX_UPLOAD_BYTES, UploadedImage};
use crate::state::AppState;

/// Request body cap for the upload routes: the image plus multipart framing.
pub const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

const TOO_LARGE: &str = "File size exceeds 5MB limit";

#[derive(Debug, Serialize)]
pub struct ImageBody {
    image: UploadedImage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImage {
    pub public_id: Option<String>,
}

fn multipart_error(err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::BadRequest(TOO_LARGE.to_owned())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

struct FilePart {
    bytes: Vec<u8>,
    file_name: Option<String>,
    content_type: Option<String>,
}

/// `POST /api/v1/upload`
///
/// Expects a `file` part and an optional `folder` part.
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<ImageBody>>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut file = None;
    let mut folder = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(ToOwned::to_owned);
                let content_type = field.content_type().map(ToOwned::to_owned);
                let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
                file = Some(FilePart {
                    bytes: bytes.to_vec(),
                    file_name,
                    content_type,
                });
            }
            Some("folder") => {
                folder = Some(field.text().await.map_err(|e| multipart_error(&e))?);
            }
            _ => {}
        }
    }

    let Some(file) = file else {
        return Err(AppError::BadRequest("No file provided".to_owned()));
    };

    let upload = ImageUpload::new(
        file.bytes,
        file.file_name,
        file.content_type,
        folder.as_deref(),
    )?;
    tracing::debug!(
        size = upload.bytes.len(),
        content_type = %upload.content_type,
        folder = %upload.folder,
        "Uploading image"
    );

    let image = state.images().upload(upload).await?;
    tracing::info!(public_id = %image.public_id, "Image uploaded");

    Ok(Json(ApiResponse::with_message(
        "Image uploaded successfully",
        ImageBody { image },
    )))
}

/// `DELETE /api/v1/upload`
#[instrument(skip(state, body))]
pub async fn destroy(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DeleteImage>,
) -> Result<Json<ApiResponse<Empty>>> {
    let public_id = body
        .public_id
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Public ID is required".to_owned()))?;

    state.images().delete(&public_id).await?;
    tracing::info!(public_id = %public_id, "Image deleted");

    Ok(Json(ApiResponse::with_message(
        "Image deleted successfully",
        Empty {},
    )))
}
