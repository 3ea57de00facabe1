//! Shopping cart handlers.
//!
//! The cart lives in the shopper's session. Every handler hydrates a
//! [`CartSession`] from it, applies one mutation and answers with the
//! updated summary.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use whiskers_core::{CartSession, CartSummary, ProductId};

use super::ApiResponse;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::SessionCartStorage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
}

const fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CartBody {
    cart: CartSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    in_cart: bool,
}

async fn hydrate(state: &AppState, session: Session) -> Result<CartSession<SessionCartStorage>> {
    let cart = CartSession::hydrate(SessionCartStorage::new(session), *state.pricing()).await?;
    Ok(cart)
}

fn respond(cart: &CartSession<SessionCartStorage>) -> Json<ApiResponse<CartBody>> {
    Json(ApiResponse::ok(CartBody {
        cart: cart.summary(),
    }))
}

/// `GET /api/v1/cart`
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<CartBody>>> {
    let cart = hydrate(&state, session).await?;
    Ok(respond(&cart))
}

/// `POST /api/v1/cart/items`
#[instrument(skip(state, session, body))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<AddItem>,
) -> Result<Json<ApiResponse<CartBody>>> {
    if body.quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_owned(),
        ));
    }

    let product = state
        .store()
        .get_product(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let mut cart = hydrate(&state, session).await?;
    cart.add(&product, body.quantity, body.variants).await?;

    let product_id = product.id.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    tracing::debug!(
        product_id = %product.id,
        item_count = cart.item_count(),
        "Added to cart"
    );
    Ok(respond(&cart))
}

/// `GET /api/v1/cart/items/{product_id}`
#[instrument(skip(state, session))]
pub async fn contains(
    State(state): State<AppState>,
    session: Session,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<ApiResponse<Membership>>> {
    let cart = hydrate(&state, session).await?;
    Ok(Json(ApiResponse::ok(Membership {
        in_cart: cart.is_in_cart(product_id),
    })))
}

/// `PATCH /api/v1/cart/items/{product_id}`
#[instrument(skip(state, session, body))]
pub async fn update_quantity(
    State(state): State<AppState>,
    session: Session,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<UpdateQuantity>,
) -> Result<Json<ApiResponse<CartBody>>> {
    let mut cart = hydrate(&state, session).await?;
    cart.update_quantity(product_id, body.quantity).await?;
    Ok(respond(&cart))
}

/// `DELETE /api/v1/cart/items/{product_id}`
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<ApiResponse<CartBody>>> {
    let mut cart = hydrate(&state, session).await?;
    cart.remove(product_id).await?;
    Ok(respond(&cart))
}

/// `DELETE /api/v1/cart`
#[instrument(skip(state, session))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<CartBody>>> {
    let mut cart = hydrate(&state, session).await?;
    cart.clear().await?;
    Ok(respond(&cart))
}
