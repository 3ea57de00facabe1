//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness check
//! GET  /health/ready                        - Readiness check (store reachable)
//!
//! # Catalog (/api/v1)
//! GET    /products                          - Filtered, sorted, paginated listing
//! POST   /products                          - Create product (admin)
//! POST   /products/fix-stock                - Re-derive inStock for every product (admin)
//! GET    /products/{id}                     - Product detail
//! PUT    /products/{id}                     - Partial update (admin)
//! DELETE /products/{id}                     - Delete product and its images (admin)
//! GET    /categories/counts                 - Product count per category
//!
//! # Feedback
//! GET  /reviews?productId=                  - Reviews with rating stats
//! POST /reviews                             - Submit review, refresh product rating
//! POST /messages                            - Contact form
//! POST /subscribers                         - Newsletter signup
//!
//! # Images (admin)
//! POST   /upload                            - Multipart image upload
//! DELETE /upload                            - Delete hosted image
//!
//! # Cart (session)
//! GET    /cart                              - Items and totals
//! DELETE /cart                              - Empty the cart
//! POST   /cart/items                        - Add product
//! GET    /cart/items/{productId}            - Whether a product is in the cart
//! PATCH  /cart/items/{productId}            - Set quantity (< 1 removes)
//! DELETE /cart/items/{productId}            - Remove product
//!
//! # Checkout (session)
//! GET    /checkout                          - Wizard state and cart summary
//! DELETE /checkout                          - Start over
//! POST   /checkout/shipping                 - Submit shipping form
//! POST   /checkout/payment                  - Submit payment form
//! POST   /checkout/back                     - Return to an earlier step
//! POST   /checkout/place-order              - Confirm the order
//! ```

pub mod cart;
pub mod categories;
pub mod checkout;
pub mod health;
pub mod messages;
pub mod products;
pub mod reviews;
pub mod subscribers;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;

/// Successful response envelope: `{"success": true, "message"?: ..., ...body}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(flatten)]
    body: T,
}

impl<T> ApiResponse<T> {
    pub const fn ok(body: T) -> Self {
        Self {
            success: true,
            message: None,
            body,
        }
    }

    pub const fn with_message(message: &'static str, body: T) -> Self {
        Self {
            success: true,
            message: Some(message),
            body,
        }
    }
}

/// Empty payload for message-only responses.
#[derive(Debug, Serialize)]
pub struct Empty {}

/// Create the `/api/v1` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(feedback_routes())
        .nest("/upload", upload_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
}

/// Create the liveness and readiness routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route("/products/fix-stock", post(products::fix_stock))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/categories/counts", get(categories::counts))
}

fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(reviews::index).post(reviews::create))
        .route("/messages", post(messages::create))
        .route("/subscribers", post(subscribers::create))
}

fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(upload::create).delete(upload::destroy))
        .layer(DefaultBodyLimit::max(upload::BODY_LIMIT_BYTES))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            get(cart::contains)
                .patch(cart::update_quantity)
                .delete(cart::remove),
        )
}

fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).delete(checkout::restart))
        .route("/shipping", post(checkout::shipping))
        .route("/payment", post(checkout::payment))
        .route("/back", post(checkout::back))
        .route("/place-order", post(checkout::place_order))
}
