//! Review submission and rating aggregation.
//!
//! Each new review triggers a full re-aggregation over the product's reviews.
//! Two concurrent submissions can race on the write-back; the last write wins
//! and the next review corrects it.

use whiskers_core::reviews::{Review, ReviewInput};

use crate::db::{RepositoryError, Store};
use crate::error::{AppError, Result};

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Validate and store a review, then refresh the product's rating.
///
/// # Errors
///
/// Returns `AppError::Validation` for invalid input, `AppError::NotFound` if
/// the product does not exist, or `AppError::Database` on storage failure.
#[tracing::instrument(skip(store, input), fields(product_id))]
pub async fn submit_review(store: &dyn Store, input: ReviewInput) -> Result<Review> {
    let review = input.validate()?;
    tracing::Span::current().record("product_id", review.product_id.as_i32());

    if store.get_product(review.product_id).await?.is_none() {
        return Err(AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()));
    }

    let product_id = review.product_id;
    let review = store
        .insert_review(review)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()),
            other => other.into(),
        })?;

    let summary = store.rating_summary(product_id).await?;
    store.set_product_rating(product_id, summary).await?;

    tracing::info!(
        review_id = %review.id,
        average_rating = %summary.average_rating,
        total_reviews = summary.total_reviews,
        "Review stored"
    );

    Ok(review)
}
