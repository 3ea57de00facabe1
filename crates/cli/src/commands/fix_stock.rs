//! Stock flag repair.

use whiskers_storefront::db::{PgStore, Store};

use super::connect;

/// Set `in_stock` from `stock_count` for every product.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the update fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = PgStore::new(connect().await?);
    let fixed = store.repair_stock_flags().await?;

    tracing::info!(
        set_to_in_stock = fixed.set_to_in_stock,
        set_to_out_of_stock = fixed.set_to_out_of_stock,
        "Stock flags repaired"
    );
    Ok(())
}
