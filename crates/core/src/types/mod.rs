//! Core types for Whiskers.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod rating;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError, looks_like_email};
pub use id::*;
pub use money::{format_usd, round_cents, round_tenths};
pub use rating::{Rating, RatingError};
pub use slug::{Slug, SlugError, slugify};
pub use status::*;
