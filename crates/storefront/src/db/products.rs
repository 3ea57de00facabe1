//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use whiskers_core::catalog::{CategoryCount, ProductQuery, StockRepair};
use whiskers_core::reviews::RatingSummary;
use whiskers_core::{NewProduct, Product, ProductId, ProductUpdate, ProductVariant, Slug};

use super::{DUPLICATE_PRODUCT, RepositoryError, conflict_on_unique};

const COLUMNS: &str = "id, name, slug, price, original_price, description, short_description, \
     images, image_public_ids, category, category_slug, tags, rating, review_count, \
     in_stock, stock_count, variants, features, is_featured, is_new_arrival, is_bestseller, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    price: Decimal,
    original_price: Option<Decimal>,
    description: String,
    short_description: String,
    images: Vec<String>,
    image_public_ids: Vec<String>,
    category: String,
    category_slug: String,
    tags: Vec<String>,
    rating: Decimal,
    review_count: i32,
    in_stock: bool,
    stock_count: i32,
    variants: Json<Vec<ProductVariant>>,
    features: Vec<String>,
    is_featured: bool,
    is_new_arrival: bool,
    is_bestseller: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: ProductId::new(r.id),
            name: r.name,
            slug: Slug::from_trusted(r.slug),
            price: r.price,
            original_price: r.original_price,
            description: r.description,
            short_description: r.short_description,
            images: r.images,
            image_public_ids: r.image_public_ids,
            category: r.category,
            category_slug: Slug::from_trusted(r.category_slug),
            tags: r.tags,
            rating: r.rating,
            review_count: r.review_count,
            in_stock: r.in_stock,
            stock_count: r.stock_count,
            variants: r.variants.0,
            features: r.features,
            is_featured: r.is_featured,
            is_new_arrival: r.is_new_arrival,
            is_bestseller: r.is_bestseller,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products matching the query, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, query: &ProductQuery) -> Result<(Vec<Product>, u64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let order = query.sort_order.as_sql();
        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM products"));
        push_filters(&mut select, query);
        select
            .push(" ORDER BY ")
            .push(query.sort_by.column())
            .push(" ")
            .push(order)
            .push(", id ")
            .push(order)
            .push(" LIMIT ")
            .push_bind(i64::from(query.page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX));

        let rows: Vec<ProductRow> = select.build_query_as().fetch_all(self.pool).await?;
        let total = u64::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {total}")))?;

        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM products WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r"
            INSERT INTO products (
                name, slug, price, original_price, description, short_description,
                images, image_public_ids, category, category_slug, tags,
                in_stock, stock_count, variants, features,
                is_featured, is_new_arrival, is_bestseller
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.images.as_slice())
        .bind(product.image_public_ids.as_slice())
        .bind(&product.category)
        .bind(product.category_slug.as_str())
        .bind(product.tags.as_slice())
        .bind(product.in_stock)
        .bind(product.stock_count)
        .bind(Json(&product.variants))
        .bind(product.features.as_slice())
        .bind(product.is_featured)
        .bind(product.is_new_arrival)
        .bind(product.is_bestseller)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_PRODUCT))?;

        Ok(row.into())
    }

    /// Apply a partial update inside a transaction.
    ///
    /// Returns `None` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a rename collides with another slug.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(None);
        };
        let mut product = Product::from(current);
        update.apply_to(&mut product);

        let row: ProductRow = sqlx::query_as(&format!(
            r"
            UPDATE products SET
                name = $2, slug = $3, price = $4, original_price = $5,
                description = $6, short_description = $7,
                images = $8, image_public_ids = $9,
                category = $10, category_slug = $11, tags = $12,
                in_stock = $13, stock_count = $14, variants = $15, features = $16,
                is_featured = $17, is_new_arrival = $18, is_bestseller = $19,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "
        ))
        .bind(id)
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.images.as_slice())
        .bind(product.image_public_ids.as_slice())
        .bind(&product.category)
        .bind(product.category_slug.as_str())
        .bind(product.tags.as_slice())
        .bind(product.in_stock)
        .bind(product.stock_count)
        .bind(Json(&product.variants))
        .bind(product.features.as_slice())
        .bind(product.is_featured)
        .bind(product.is_new_arrival)
        .bind(product.is_bestseller)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_PRODUCT))?;

        tx.commit().await?;

        Ok(Some(row.into()))
    }

    /// Delete a product (reviews cascade), returning the deleted record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Overwrite the rating aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_rating(
        &self,
        id: ProductId,
        summary: RatingSummary,
    ) -> Result<(), RepositoryError> {
        let review_count = i32::try_from(summary.total_reviews).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "review count {} out of range",
                summary.total_reviews
            ))
        })?;

        let result = sqlx::query(
            r"
            UPDATE products
            SET rating = $2, review_count = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(summary.average_rating)
        .bind(review_count)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Re-derive `in_stock` from `stock_count` for every product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn repair_stock_flags(&self) -> Result<StockRepair, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let set_to_in_stock = sqlx::query(
            "UPDATE products SET in_stock = TRUE, updated_at = NOW() WHERE stock_count > 0 AND NOT in_stock",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let set_to_out_of_stock = sqlx::query(
            "UPDATE products SET in_stock = FALSE, updated_at = NOW() WHERE stock_count <= 0 AND in_stock",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(StockRepair {
            set_to_in_stock,
            set_to_out_of_stock,
        })
    }

    /// Product counts grouped by category slug, largest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_counts(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r"
            SELECT category_slug, MIN(category), COUNT(*)
            FROM products
            GROUP BY category_slug
            ORDER BY COUNT(*) DESC, category_slug
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(slug, name, count)| CategoryCount { slug, name, count })
            .collect())
    }
}

/// Append the listing filters as a `WHERE` clause.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE TRUE");

    if let Some(slug) = &query.slug {
        builder.push(" AND slug = ").push_bind(slug.clone());
    }
    if let Some(category) = &query.category {
        builder.push(" AND category_slug = ").push_bind(category.clone());
    }
    if query.featured_only {
        builder.push(" AND is_featured");
    }
    if let Some(search) = &query.search {
        let patterns = search_patterns(search);
        if !patterns.is_empty() {
            builder
                .push(" AND (name || ' ' || description || ' ' || array_to_string(tags, ' ')) ILIKE ANY(")
                .push_bind(patterns)
                .push(")");
        }
    }
}

/// One `ILIKE` pattern per search term, with wildcards escaped.
fn search_patterns(search: &str) -> Vec<String> {
    search
        .split_whitespace()
        .map(|term| {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
        .collect()
}
