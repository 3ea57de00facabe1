//! Product reviews and the rating aggregate kept on each product.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::listing::PageRequest;
use crate::types::{ProductId, Rating, ReviewId, SortOrder, round_tenths};
use crate::validation::{ValidationError, max_chars, required};

pub const MAX_AUTHOR_CHARS: usize = 100;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_CONTENT_CHARS: usize = 2000;

/// A stored review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author: String,
    pub email: String,
    pub rating: Rating,
    pub title: String,
    pub content: String,
    pub verified: bool,
    pub helpful: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review submission as sent by the product page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub product_id: Option<ProductId>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// A validated review ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub product_id: ProductId,
    pub author: String,
    pub email: String,
    pub rating: Rating,
    pub title: String,
    pub content: String,
}

impl ReviewInput {
    /// Trim, normalize and check the submission.
    ///
    /// Whether the product exists is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a field is missing, the rating is out of
    /// range, or a text field is too long.
    pub fn validate(self) -> Result<NewReview, ValidationError> {
        let (Some(product_id), Some(author), Some(email), Some(rating), Some(title), Some(content)) = (
            self.product_id,
            required(self.author),
            required(self.email),
            self.rating,
            required(self.title),
            required(self.content),
        ) else {
            return Err(ValidationError::new("All fields are required"));
        };

        let rating = Rating::new(rating)?;
        max_chars("author", &author, MAX_AUTHOR_CHARS, "Author name")?;
        max_chars("title", &title, MAX_TITLE_CHARS, "Title")?;
        max_chars("content", &content, MAX_CONTENT_CHARS, "Review")?;

        Ok(NewReview {
            product_id,
            author,
            email: email.to_lowercase(),
            rating,
            title,
            content,
        })
    }
}

/// Mean rating and review count for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal; zero without reviews.
    #[serde(with = "rust_decimal::serde::float")]
    pub average_rating: Decimal,
    pub total_reviews: i64,
}

impl RatingSummary {
    /// Aggregate a full set of ratings.
    #[must_use]
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = Rating>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0_i64, 0_i64), |(sum, count), r| {
                (sum + i64::from(r.stars()), count + 1)
            });
        Self::from_sum(sum, count)
    }

    /// Build from a rating sum and count, e.g. from a SQL aggregate.
    #[must_use]
    pub fn from_sum(sum: i64, count: i64) -> Self {
        if count <= 0 {
            return Self::default();
        }
        Self {
            average_rating: round_tenths(Decimal::from(sum) / Decimal::from(count)),
            total_reviews: count,
        }
    }
}

/// Fields a review listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReviewSort {
    #[default]
    CreatedAt,
    Rating,
    Helpful,
}

impl ReviewSort {
    /// Column backing this sort key.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Rating => "rating",
            Self::Helpful => "helpful",
        }
    }
}

impl std::str::FromStr for ReviewSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "rating" => Ok(Self::Rating),
            "helpful" => Ok(Self::Helpful),
            other => Err(ValidationError::field(
                "sortBy",
                format!("Invalid sortBy: {other}"),
            )),
        }
    }
}

/// A review listing request for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewQuery {
    pub product_id: ProductId,
    pub page: PageRequest,
    pub sort_by: ReviewSort,
    pub sort_order: SortOrder,
}

impl ReviewQuery {
    /// Default page size for review listings.
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Order two reviews according to the requested sort.
    #[must_use]
    pub fn compare(&self, a: &Review, b: &Review) -> Ordering {
        let ordering = match self.sort_by {
            ReviewSort::CreatedAt => a.created_at.cmp(&b.created_at),
            ReviewSort::Rating => a.rating.cmp(&b.rating),
            ReviewSort::Helpful => a.helpful.cmp(&b.helpful),
        }
        .then_with(|| a.id.cmp(&b.id));

        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}
