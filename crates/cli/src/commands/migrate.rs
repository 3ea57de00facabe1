//! Database migration command.
//!
//! Applies the catalog migrations from `crates/storefront/migrations/`, then
//! creates the `tower_sessions` schema used for shopper sessions.

use tower_sessions_sqlx_store::PostgresStore;
use whiskers_storefront::db::MIGRATOR;

use super::connect;

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    tracing::info!("Running catalog migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Running session store migrations...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
