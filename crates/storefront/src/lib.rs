//! Whiskers storefront library.
//!
//! JSON API for the cat shop: catalog, reviews, contact inbox, image
//! uploads, and a session-backed cart with a checkout wizard. The binary in
//! `main.rs` wires configuration and backends into [`app`]; the integration
//! tests drive the same router in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use axum::extract::Request;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use state::AppState;

/// Build the full application router.
///
/// # Arguments
///
/// * `state` - Shared handler state
/// * `session_store` - Backing store for shopper sessions
/// * `secure_cookies` - Restrict the session cookie to HTTPS
pub fn app<S>(state: AppState, session_store: S, secure_cookies: bool) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(session_store, secure_cookies);

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .merge(routes::health_routes())
        .nest("/api/v1", routes::api_routes())
        .layer(session_layer)
        .with_state(state)
        // Outermost first: Sentry hub, transaction, request span, request id
        .layer(
            ServiceBuilder::new()
                .layer(sentry_tower::NewSentryLayer::new_from_top())
                .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
                .layer(trace_layer)
                .layer(axum::middleware::from_fn(middleware::request_id_middleware)),
        )
}
