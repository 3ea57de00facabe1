//! Review handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use whiskers_core::reviews::{RatingSummary, Review, ReviewInput, ReviewQuery, ReviewSort};
use whiskers_core::{PageRequest, Pagination, ProductId, SortOrder};

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery};
use crate::services;
use crate::state::AppState;

/// Query parameters for a product's review listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub product_id: Option<ProductId>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl ListParams {
    fn into_query(self) -> Result<ReviewQuery> {
        let product_id = self
            .product_id
            .ok_or_else(|| AppError::BadRequest("Product ID is required".to_owned()))?;
        let sort_by = self
            .sort_by
            .as_deref()
            .map(str::parse::<ReviewSort>)
            .transpose()?
            .unwrap_or_default();

        Ok(ReviewQuery {
            product_id,
            page: PageRequest::new(self.page, self.limit, ReviewQuery::DEFAULT_LIMIT)?,
            sort_by,
            sort_order: self.sort_order.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewList {
    reviews: Vec<Review>,
    stats: RatingSummary,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ReviewBody {
    review: Review,
}

/// `GET /api/v1/reviews?productId=`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<ApiResponse<ReviewList>>> {
    let query = params.into_query()?;
    let (reviews, total) = state.store().list_reviews(&query).await?;
    let stats = state.store().rating_summary(query.product_id).await?;

    Ok(Json(ApiResponse::ok(ReviewList {
        reviews,
        stats,
        pagination: query.page.paginate(total),
    })))
}

/// `POST /api/v1/reviews`
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewBody>>)> {
    let review = services::reviews::submit_review(state.store(), input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Review submitted successfully",
            ReviewBody { review },
        )),
    ))
}
