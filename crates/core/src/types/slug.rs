//! URL-safe slugs derived from display names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when deriving a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The name contains no ASCII letters or digits.
    #[error("name must contain at least one letter or digit")]
    Empty,
}

/// A normalized, URL-safe identifier.
///
/// Lowercase ASCII letters and digits, with every run of other characters
/// collapsed into a single `-` and no leading or trailing hyphen.
///
/// ```
/// use whiskers_core::Slug;
///
/// let slug = Slug::from_name("Organic Salmon Feast!").unwrap();
/// assert_eq!(slug.as_str(), "organic-salmon-feast");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display name.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if nothing URL-safe remains.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(SlugError::Empty);
        }
        Ok(Self(slug))
    }

    /// Wrap a value that is already known to be a slug (e.g. read from storage).
    #[must_use]
    pub const fn from_trusted(value: String) -> Self {
        Self(value)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the slug and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Lowercase, collapse non-alphanumeric runs to `-`, strip edge hyphens.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_examples() {
        assert_eq!(slugify("Organic Salmon Feast!"), "organic-salmon-feast");
        assert_eq!(slugify("  Toys & Games  "), "toys-games");
        assert_eq!(slugify("--Catnip--Deluxe--"), "catnip-deluxe");
        assert_eq!(slugify("Scratcher 3000"), "scratcher-3000");
        assert_eq!(slugify("Crème Brûlée Treats"), "cr-me-br-l-e-treats");
    }

    #[test]
    fn test_slugify_idempotent() {
        let once = slugify("Feather Wand (Large)");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn test_from_name_empty() {
        assert_eq!(Slug::from_name("!!!"), Err(SlugError::Empty));
        assert_eq!(Slug::from_name(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_display() {
        let slug = Slug::from_name("Cat Beds").unwrap();
        assert_eq!(slug.to_string(), "cat-beds");
    }
}
