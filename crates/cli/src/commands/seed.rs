//! Seed the catalog from a YAML product list.
//!
//! The file holds a list of products in the same shape the admin API accepts
//! (`name`, `price`, `category`, `stockCount`, `variants`, ...). Slugs and
//! stock flags are derived exactly as they are for API writes. Products whose
//! name is already taken are skipped, so the command can be re-run safely.

use std::path::Path;

use tracing::{error, info, warn};
use whiskers_core::{NewProduct, ProductInput};
use whiskers_storefront::db::{PgStore, RepositoryError, Store};

use super::connect;

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse and validate every product in the file.
///
/// # Errors
///
/// Returns an error listing each invalid entry by position and name.
pub fn parse_products(content: &str) -> Result<Vec<NewProduct>, Box<dyn std::error::Error>> {
    let inputs: Vec<ProductInput> = serde_yaml::from_str(content)?;

    let mut products = Vec::with_capacity(inputs.len());
    let mut errors = Vec::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let name = input.name.clone().unwrap_or_default();
        match input.into_new_product() {
            Ok(product) => products.push(product),
            Err(e) => errors.push(format!("#{} {name:?}: {e}", index + 1)),
        }
    }

    if !errors.is_empty() {
        error!("Product file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} invalid products", errors.len()).into());
    }

    Ok(products)
}

/// Insert products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or the database fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_products(&content)?;
    info!(products = products.len(), "Product file validated");

    let store = PgStore::new(connect().await?);
    let report = insert_all(&store, products).await?;

    info!("Seeding complete!");
    info!("  Products inserted: {}", report.inserted);
    info!("  Products skipped (already exist): {}", report.skipped);
    Ok(())
}

async fn insert_all(
    store: &dyn Store,
    products: Vec<NewProduct>,
) -> Result<SeedReport, RepositoryError> {
    let mut report = SeedReport::default();
    for product in products {
        let slug = product.slug.clone();
        match store.insert_product(product).await {
            Ok(_) => report.inserted += 1,
            Err(RepositoryError::Conflict(_)) => {
                warn!(slug = %slug, "Product already exists, skipping");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}
