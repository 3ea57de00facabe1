//! Whiskers Core - Domain types and shop rules.
//!
//! This crate holds everything about the cat shop that does not need I/O:
//! - `storefront` - JSON API server that persists and serves these types
//! - `cli` - Command-line tools for migrations, seeding and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types, pure rules and storage ports. Database
//! access lives behind the optional `postgres` feature (type mappings only);
//! queries and HTTP clients live in the storefront.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, slugs, ratings and statuses
//! - [`catalog`] - Products, variants and create/update validation
//! - [`cart`] - Cart lines and totals
//! - [`cart_session`] - Cart bound to a storage port
//! - [`checkout`] - The checkout wizard
//! - [`reviews`] - Reviews and rating aggregation
//! - [`inbox`] - Newsletter subscribers and contact messages
//! - [`listing`] - Pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod cart_session;
pub mod catalog;
pub mod checkout;
pub mod inbox;
pub mod listing;
pub mod reviews;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartItem, CartProduct, CartTotals, PricingPolicy};
pub use cart_session::{CART_STORAGE_KEY, CartSession, CartSessionError, CartStorage, CartSummary};
pub use catalog::{NewProduct, Product, ProductInput, ProductUpdate, ProductVariant, VariantOption};
pub use checkout::{CHECKOUT_STORAGE_KEY, CheckoutError, CheckoutStep, CheckoutWizard};
pub use listing::{PageRequest, Pagination};
pub use types::*;
pub use validation::{FieldErrors, ValidationError};
