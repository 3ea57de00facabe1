//! Checkout wizard handlers.
//!
//! The wizard state is kept in the session next to the cart. A rejected
//! transition still saves the wizard so the submitted form and its field
//! errors survive a reload.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use whiskers_core::checkout::{OrderConfirmation, PaymentInfo, ShippingAddress};
use whiskers_core::{CartSession, CartSummary, CheckoutError, CheckoutStep, CheckoutWizard};

use super::ApiResponse;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::SessionCartStorage;
use crate::middleware::session::{load_checkout, save_checkout};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutBody {
    checkout: CheckoutWizard,
    cart: CartSummary,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationBody {
    confirmation: OrderConfirmation,
    checkout: CheckoutWizard,
}

#[derive(Debug, Deserialize)]
pub struct BackTo {
    pub to: CheckoutStep,
}

async fn respond(
    state: &AppState,
    session: Session,
    wizard: CheckoutWizard,
) -> Result<Json<ApiResponse<CheckoutBody>>> {
    let cart = CartSession::hydrate(SessionCartStorage::new(session), *state.pricing()).await?;
    Ok(Json(ApiResponse::ok(CheckoutBody {
        checkout: wizard,
        cart: cart.summary(),
    })))
}

/// Save the wizard, then surface the transition result.
async fn commit(
    session: &Session,
    wizard: &CheckoutWizard,
    outcome: std::result::Result<(), CheckoutError>,
) -> Result<()> {
    save_checkout(session, wizard).await?;
    outcome.map_err(|e| {
        tracing::debug!(step = %wizard.step, error = %e, "Checkout transition rejected");
        AppError::from(e)
    })
}

/// `GET /api/v1/checkout`
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<CheckoutBody>>> {
    let wizard = load_checkout(&session).await?;
    respond(&state, session, wizard).await
}

/// `POST /api/v1/checkout/shipping`
#[instrument(skip(state, session, address))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    ApiJson(address): ApiJson<ShippingAddress>,
) -> Result<Json<ApiResponse<CheckoutBody>>> {
    let mut wizard = load_checkout(&session).await?;
    let outcome = wizard.submit_shipping(address);
    commit(&session, &wizard, outcome).await?;
    respond(&state, session, wizard).await
}

/// `POST /api/v1/checkout/payment`
#[instrument(skip(state, session, payment))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    ApiJson(payment): ApiJson<PaymentInfo>,
) -> Result<Json<ApiResponse<CheckoutBody>>> {
    let mut wizard = load_checkout(&session).await?;
    let outcome = wizard.submit_payment(payment);
    commit(&session, &wizard, outcome).await?;
    respond(&state, session, wizard).await
}

/// `POST /api/v1/checkout/back`
#[instrument(skip(state, session))]
pub async fn back(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<BackTo>,
) -> Result<Json<ApiResponse<CheckoutBody>>> {
    let mut wizard = load_checkout(&session).await?;
    let outcome = wizard.back(body.to);
    commit(&session, &wizard, outcome).await?;
    respond(&state, session, wizard).await
}

/// `POST /api/v1/checkout/place-order`
///
/// Simulates processing time, then empties the cart.
#[instrument(skip(state, session))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<ConfirmationBody>>> {
    let mut wizard = load_checkout(&session).await?;
    let mut cart =
        CartSession::hydrate(SessionCartStorage::new(session.clone()), *state.pricing()).await?;

    // A rejected order leaves the wizard untouched, so there is nothing to save.
    let outcome = {
        let mut rng = rand::rng();
        wizard.place_order(cart.cart(), state.pricing(), &mut rng)
    };
    let confirmation = outcome?;

    tokio::time::sleep(state.checkout_latency()).await;

    cart.clear().await?;
    save_checkout(&session, &wizard).await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", confirmation.order_id.as_str())]),
    );
    tracing::info!(
        order_id = %confirmation.order_id,
        item_count = confirmation.item_count,
        total = %confirmation.totals.total,
        "Order placed"
    );

    Ok(Json(ApiResponse::with_message(
        "Order placed successfully",
        ConfirmationBody {
            confirmation,
            checkout: wizard,
        },
    )))
}

/// `DELETE /api/v1/checkout`
#[instrument(skip(state, session))]
pub async fn restart(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<CheckoutBody>>> {
    let mut wizard = load_checkout(&session).await?;
    wizard.restart();
    save_checkout(&session, &wizard).await?;
    respond(&state, session, wizard).await
}
