//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Product lifecycle steps that touch more than the store
//! - `reviews` - Review submission and rating aggregation
//! - `images` - Image hosting (Cloudinary)

pub mod catalog;
pub mod images;
pub mod reviews;
