//! Review repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use whiskers_core::reviews::{NewReview, RatingSummary, Review, ReviewQuery};
use whiskers_core::{ProductId, Rating, ReviewId};

use super::RepositoryError;

const COLUMNS: &str =
    "id, product_id, author, email, rating, title, content, verified, helpful, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    author: String,
    email: String,
    rating: i16,
    title: String,
    content: String,
    verified: bool,
    helpful: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(r: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(r.rating)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating in database: {e}"))
        })?;

        Ok(Self {
            id: ReviewId::new(r.id),
            product_id: ProductId::new(r.product_id),
            author: r.author,
            email: r.email,
            rating,
            title: r.title,
            content: r.content,
            verified: r.verified,
            helpful: r.helpful,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of a product's reviews, with the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored rating is out of range.
    pub async fn list(&self, query: &ReviewQuery) -> Result<(Vec<Review>, u64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE product_id = $1")
            .bind(query.product_id)
            .fetch_one(self.pool)
            .await?;

        let order = query.sort_order.as_sql();
        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COLUMNS} FROM reviews WHERE product_id = "
        ));
        select
            .push_bind(query.product_id)
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

        let rows: Vec<ReviewRow> = select.build_query_as().fetch_all(self.pool).await?;
        let reviews = rows
            .into_iter()
            .map(Review::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let total = u64::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {total}")))?;

        Ok((reviews, total))
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let row: ReviewRow = sqlx::query_as(&format!(
            r"
            INSERT INTO reviews (product_id, author, email, rating, title, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "
        ))
        .bind(review.product_id)
        .bind(&review.author)
        .bind(&review.email)
        .bind(i16::from(review.rating.stars()))
        .bind(&review.title)
        .bind(&review.content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Mean rating and count over every review of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rating_summary(
        &self,
        product_id: ProductId,
    ) -> Result<RatingSummary, RepositoryError> {
        let (sum, count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(rating), 0)::BIGINT, COUNT(*) FROM reviews WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(RatingSummary::from_sum(sum, count))
    }
}
