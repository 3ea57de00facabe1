//! Whiskers storefront - JSON API for the cat shop.
//!
//! This binary serves the storefront API on port 3000.
//!
//! # Backends
//!
//! - `PostgreSQL` (default): catalog, reviews and inbox in the database,
//!   sessions in the `tower_sessions` schema
//! - Memory (`WHISKERS_STORE=memory`): everything in-process, for demos and
//!   local development
//!
//! Product images go to Cloudinary when the `CLOUDINARY_*` variables are set;
//! otherwise uploads answer with an error.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tower_sessions::MemoryStore as MemorySessionStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whiskers_storefront::config::{StoreConfig, StorefrontConfig};
use whiskers_storefront::db::{self, MemoryStore, PgStore, Store};
use whiskers_storefront::services::images::{CloudinaryClient, DisabledImageHost, ImageHost};
use whiskers_storefront::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn image_host(config: &StorefrontConfig) -> Arc<dyn ImageHost> {
    let Some(cloudinary) = config.cloudinary.as_ref() else {
        tracing::warn!("Cloudinary not configured, image uploads are disabled");
        return Arc::new(DisabledImageHost);
    };

    match CloudinaryClient::new(cloudinary) {
        Ok(client) => {
            tracing::info!(cloud_name = %cloudinary.cloud_name, "Cloudinary image host enabled");
            Arc::new(client)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build Cloudinary client, image uploads are disabled");
            Arc::new(DisabledImageHost)
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "whiskers_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let images = image_host(&config);
    let secure = config.secure_cookies();
    let addr = config.socket_addr();

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p whiskers-cli -- migrate
    let app = match &config.store {
        StoreConfig::Postgres { database_url } => {
            let pool = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");

            let sessions = PostgresStore::new(pool.clone());
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
            whiskers_storefront::app(AppState::new(config.clone(), store, images), sessions, secure)
        }
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            whiskers_storefront::app(
                AppState::new(config.clone(), store, images),
                MemorySessionStore::default(),
                secure,
            )
        }
    };

    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
