//! Category handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;
use whiskers_core::catalog::CategoryCount;

use super::ApiResponse;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CategoryCounts {
    /// Number of products across all categories.
    total: i64,
    categories: Vec<CategoryCount>,
}

/// `GET /api/v1/categories/counts`
#[instrument(skip(state))]
pub async fn counts(State(state): State<AppState>) -> Result<Json<ApiResponse<CategoryCounts>>> {
    let categories = state.store().category_counts().await?;
    let total = categories.iter().map(|c| c.count).sum();

    Ok(Json(ApiResponse::ok(CategoryCounts { total, categories })))
}
