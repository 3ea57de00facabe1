//! Product catalog handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use whiskers_core::catalog::{ProductQuery, ProductSort, StockRepair};
use whiskers_core::{PageRequest, Pagination, Product, ProductId, ProductInput, SortOrder, ValidationError};

use super::{ApiResponse, Empty};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services;
use crate::state::AppState;

/// Default page size for product listings.
const DEFAULT_LIMIT: u32 = 50;

const NOT_FOUND: &str = "Product not found";

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<String>,
    pub slug: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl ListParams {
    /// Normalize into a store query.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown sort key or bad pagination.
    pub fn into_query(self) -> std::result::Result<ProductQuery, ValidationError> {
        let sort_by = self
            .sort_by
            .as_deref()
            .map(str::parse::<ProductSort>)
            .transpose()?
            .unwrap_or_default();

        Ok(ProductQuery {
            category: non_empty(self.category).map(|c| c.to_lowercase()),
            search: non_empty(self.search),
            featured_only: self.featured.as_deref() == Some("true"),
            slug: non_empty(self.slug).map(|s| s.to_lowercase()),
            page: PageRequest::new(self.page, self.limit, DEFAULT_LIMIT)?,
            sort_by,
            sort_order: self.sort_order.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    products: Vec<Product>,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProductBody {
    product: Product,
}

#[derive(Debug, Serialize)]
pub struct StockRepairBody {
    fixed: StockRepair,
}

/// `GET /api/v1/products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<ApiResponse<ProductList>>> {
    let query = params.into_query()?;
    let (products, total) = state.store().list_products(&query).await?;

    Ok(Json(ApiResponse::ok(ProductList {
        products,
        pagination: query.page.paginate(total),
    })))
}

/// `POST /api/v1/products`
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<ProductBody>>)> {
    let product = input.into_new_product()?;
    let product = state.store().insert_product(product).await?;

    tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Product created successfully",
            ProductBody { product },
        )),
    ))
}

/// `GET /api/v1/products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ApiResponse<ProductBody>>> {
    let product = state
        .store()
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;

    Ok(Json(ApiResponse::ok(ProductBody { product })))
}

/// `PUT /api/v1/products/{id}`
#[instrument(skip(state, input))]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<ApiResponse<ProductBody>>> {
    let update = input.into_update()?;
    let product = state
        .store()
        .update_product(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;

    tracing::info!(product_id = %product.id, "Product updated");

    Ok(Json(ApiResponse::with_message(
        "Product updated successfully",
        ProductBody { product },
    )))
}

/// `DELETE /api/v1/products/{id}`
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ApiResponse<Empty>>> {
    services::catalog::delete_product(state.store(), state.images(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;

    Ok(Json(ApiResponse::with_message(
        "Product deleted successfully",
        Empty {},
    )))
}

/// `POST /api/v1/products/fix-stock`
#[instrument(skip(state))]
pub async fn fix_stock(State(state): State<AppState>) -> Result<Json<ApiResponse<StockRepairBody>>> {
    let fixed = state.store().repair_stock_flags().await?;

    tracing::info!(
        set_to_in_stock = fixed.set_to_in_stock,
        set_to_out_of_stock = fixed.set_to_out_of_stock,
        "Stock flags repaired"
    );

    Ok(Json(ApiResponse::with_message(
        "Stock status fixed for all products",
        StockRepairBody { fixed },
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_defaults() {
        let query = ListParams::default().into_query().unwrap();
        assert_eq!(query.page.limit(), 50);
        assert_eq!(query.page.page(), 1);
        assert_eq!(query.sort_by, ProductSort::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert!(!query.featured_only);
    }

    #[test]
    fn test_list_params_normalize() {
        let query = ListParams {
            category: Some(" Cat-Toys ".to_owned()),
            slug: Some("Feather-Wand".to_owned()),
            search: Some("   ".to_owned()),
            featured: Some("true".to_owned()),
            sort_by: Some("reviewCount".to_owned()),
            ..ListParams::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.category.as_deref(), Some("cat-toys"));
        assert_eq!(query.slug.as_deref(), Some("feather-wand"));
        assert_eq!(query.search, None);
        assert!(query.featured_only);
        assert_eq!(query.sort_by, ProductSort::ReviewCount);
    }

    #[test]
    fn test_list_params_reject_unknown_sort() {
        let err = ListParams {
            sort_by: Some("$where".to_owned()),
            ..ListParams::default()
        }
        .into_query()
        .unwrap_err();
        assert_eq!(err.field, Some("sortBy"));
    }
}
