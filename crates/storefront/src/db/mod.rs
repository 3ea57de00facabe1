//! Persistence for the storefront.
//!
//! # Tables
//!
//! - `products` - Catalog records (variants as `JSONB`, lists as `TEXT[]`)
//! - `reviews` - Customer reviews, cascade-deleted with their product
//! - `subscribers` - Newsletter addresses (unique)
//! - `messages` - Contact form submissions
//! - `tower_sessions.session` - Cart and checkout state (created by the session store)
//!
//! # Backends
//!
//! Handlers only see the [`Store`] trait. [`PgStore`] is the production
//! backend; [`MemoryStore`] keeps everything in process for local runs and
//! the integration tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p whiskers-cli -- migrate
//! ```

pub mod inbox;
pub mod memory;
pub mod products;
pub mod reviews;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use whiskers_core::catalog::{CategoryCount, ProductQuery, StockRepair};
use whiskers_core::inbox::{Message, NewMessage, Subscriber};
use whiskers_core::reviews::{NewReview, RatingSummary, Review, ReviewQuery};
use whiskers_core::{Email, NewProduct, Product, ProductId, ProductUpdate};

pub use inbox::InboxRepository;
pub use memory::MemoryStore;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug).
    #[error("{0}")]
    Conflict(String),
}

/// Message reported when a product name collides with an existing slug.
pub const DUPLICATE_PRODUCT: &str = "A product with this name already exists";

/// Message reported when an address is already on the newsletter list.
pub const DUPLICATE_SUBSCRIBER: &str = "This email is already subscribed!";

/// Storage port used by the HTTP handlers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// One page of products matching the query, plus the total match count.
    async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<(Vec<Product>, u64), RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError>;

    /// Insert a product; `Conflict` if the slug is taken.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Apply a partial update; `Conflict` if a rename collides with another slug.
    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product and its reviews, returning what was removed.
    async fn delete_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Overwrite a product's rating aggregate.
    async fn set_product_rating(
        &self,
        id: ProductId,
        summary: RatingSummary,
    ) -> Result<(), RepositoryError>;

    /// Re-derive `in_stock` from `stock_count` across the catalog.
    async fn repair_stock_flags(&self) -> Result<StockRepair, RepositoryError>;

    /// Product counts per category, largest first.
    async fn category_counts(&self) -> Result<Vec<CategoryCount>, RepositoryError>;

    /// One page of a product's reviews, plus the total review count.
    async fn list_reviews(&self, query: &ReviewQuery)
    -> Result<(Vec<Review>, u64), RepositoryError>;

    async fn insert_review(&self, review: NewReview) -> Result<Review, RepositoryError>;

    /// Aggregate over every stored review of a product.
    async fn rating_summary(&self, product_id: ProductId) -> Result<RatingSummary, RepositoryError>;

    /// Add a newsletter subscriber; `Conflict` if already subscribed.
    async fn insert_subscriber(&self, email: &Email) -> Result<Subscriber, RepositoryError>;

    async fn insert_message(&self, message: NewMessage) -> Result<Message, RepositoryError>;
}

/// `PostgreSQL` implementation of [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        ProductRepository::new(&self.pool).list(query).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_id(id).await
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_slug(slug).await
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        ProductRepository::new(&self.pool).create(&product).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).update(id, update).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).delete(id).await
    }

    async fn set_product_rating(
        &self,
        id: ProductId,
        summary: RatingSummary,
    ) -> Result<(), RepositoryError> {
        ProductRepository::new(&self.pool)
            .set_rating(id, summary)
            .await
    }

    async fn repair_stock_flags(&self) -> Result<StockRepair, RepositoryError> {
        ProductRepository::new(&self.pool).repair_stock_flags().await
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        ProductRepository::new(&self.pool).category_counts().await
    }

    async fn list_reviews(
        &self,
        query: &ReviewQuery,
    ) -> Result<(Vec<Review>, u64), RepositoryError> {
        ReviewRepository::new(&self.pool).list(query).await
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review, RepositoryError> {
        ReviewRepository::new(&self.pool).create(&review).await
    }

    async fn rating_summary(&self, product_id: ProductId) -> Result<RatingSummary, RepositoryError> {
        ReviewRepository::new(&self.pool)
            .rating_summary(product_id)
            .await
    }

    async fn insert_subscriber(&self, email: &Email) -> Result<Subscriber, RepositoryError> {
        InboxRepository::new(&self.pool).subscribe(email).await
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        InboxRepository::new(&self.pool)
            .create_message(&message)
            .await
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique violation to `Conflict`, passing other errors through.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
