//! In-process [`Store`] backend.
//!
//! Used for local development without `PostgreSQL` and by the integration
//! tests. Behaves like [`PgStore`](super::PgStore): same conflicts, same
//! ordering, same cascade from products to reviews.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use whiskers_core::catalog::{CategoryCount, ProductQuery, StockRepair, in_stock};
use whiskers_core::inbox::{Message, NewMessage, Subscriber};
use whiskers_core::reviews::{NewReview, RatingSummary, Review, ReviewQuery};
use whiskers_core::{
    Email, MessageId, MessageStatus, NewProduct, Product, ProductId, ProductUpdate, ReviewId,
    SubscriberId,
};

use super::{DUPLICATE_PRODUCT, DUPLICATE_SUBSCRIBER, RepositoryError, Store};

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    reviews: Vec<Review>,
    subscribers: Vec<Subscriber>,
    messages: Vec<Message>,
    last_product_id: i32,
    last_review_id: i32,
    last_subscriber_id: i32,
    last_message_id: i32,
}

fn next_id(last: &mut i32) -> i32 {
    *last += 1;
    *last
}

impl Tables {
    fn slug_taken(&self, slug: &str, except: Option<ProductId>) -> bool {
        self.products
            .values()
            .any(|p| p.slug.as_str() == slug && Some(p.id) != except)
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Product> = tables
            .products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as u64;
        Ok((query.page.slice(&matching), total))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .await
            .products
            .values()
            .find(|p| p.slug.as_str() == slug)
            .cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(product.slug.as_str(), None) {
            return Err(RepositoryError::Conflict(DUPLICATE_PRODUCT.to_owned()));
        }

        let now = Utc::now();
        let id = ProductId::new(next_id(&mut tables.last_product_id));
        let product = Product {
            id,
            name: product.name,
            slug: product.slug,
            price: product.price,
            original_price: product.original_price,
            description: product.description,
            short_description: product.short_description,
            images: product.images,
            image_public_ids: product.image_public_ids,
            category: product.category,
            category_slug: product.category_slug,
            tags: product.tags,
            rating: rust_decimal::Decimal::ZERO,
            review_count: 0,
            in_stock: product.in_stock,
            stock_count: product.stock_count,
            variants: product.variants,
            features: product.features,
            is_featured: product.is_featured,
            is_new_arrival: product.is_new_arrival,
            is_bestseller: product.is_bestseller,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(slug) = &update.slug
            && tables.slug_taken(slug.as_str(), Some(id))
        {
            return Err(RepositoryError::Conflict(DUPLICATE_PRODUCT.to_owned()));
        }

        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        update.apply_to(product);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let removed = tables.products.remove(&id);
        if removed.is_some() {
            tables.reviews.retain(|r| r.product_id != id);
        }
        Ok(removed)
    }

    async fn set_product_rating(
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

        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        product.rating = summary.average_rating;
        product.review_count = review_count;
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn repair_stock_flags(&self) -> Result<StockRepair, RepositoryError> {
        let mut tables = self.tables.write().await;
        let mut repair = StockRepair::default();
        for product in tables.products.values_mut() {
            let derived = in_stock(product.stock_count);
            if product.in_stock == derived {
                continue;
            }
            if derived {
                repair.set_to_in_stock += 1;
            } else {
                repair.set_to_out_of_stock += 1;
            }
            product.in_stock = derived;
            product.updated_at = Utc::now();
        }
        Ok(repair)
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut groups: BTreeMap<&str, (&str, i64)> = BTreeMap::new();
        for product in tables.products.values() {
            let entry = groups
                .entry(product.category_slug.as_str())
                .or_insert((product.category.as_str(), 0));
            entry.0 = entry.0.min(product.category.as_str());
            entry.1 += 1;
        }

        let mut counts: Vec<CategoryCount> = groups
            .into_iter()
            .map(|(slug, (name, count))| CategoryCount {
                slug: slug.to_owned(),
                name: name.to_owned(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.slug.cmp(&b.slug)));
        Ok(counts)
    }

    async fn list_reviews(
        &self,
        query: &ReviewQuery,
    ) -> Result<(Vec<Review>, u64), RepositoryError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.product_id == query.product_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as u64;
        Ok((query.page.slice(&matching), total))
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&review.product_id) {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        let review = Review {
            id: ReviewId::new(next_id(&mut tables.last_review_id)),
            product_id: review.product_id,
            author: review.author,
            email: review.email,
            rating: review.rating,
            title: review.title,
            content: review.content,
            verified: false,
            helpful: 0,
            created_at: now,
            updated_at: now,
        };
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn rating_summary(&self, product_id: ProductId) -> Result<RatingSummary, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(RatingSummary::from_ratings(
            tables
                .reviews
                .iter()
                .filter(|r| r.product_id == product_id)
                .map(|r| r.rating),
        ))
    }

    async fn insert_subscriber(&self, email: &Email) -> Result<Subscriber, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.subscribers.iter().any(|s| &s.email == email) {
            return Err(RepositoryError::Conflict(DUPLICATE_SUBSCRIBER.to_owned()));
        }

        let subscriber = Subscriber {
            id: SubscriberId::new(next_id(&mut tables.last_subscriber_id)),
            email: email.clone(),
            created_at: Utc::now(),
        };
        tables.subscribers.push(subscriber.clone());
        Ok(subscriber)
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut tables = self.tables.write().await;
        let message = Message {
            id: MessageId::new(next_id(&mut tables.last_message_id)),
            first_name: message.first_name,
            last_name: message.last_name,
            email: message.email,
            subject: message.subject,
            message: message.message,
            status: MessageStatus::New,
            created_at: Utc::now(),
        };
        tables.messages.push(message.clone());
        Ok(message)
    }
}
