//! Input validation errors.

use std::collections::BTreeMap;

use crate::types::{EmailError, RatingError, SlugError};

/// Per-field error messages keyed by the camelCase field name.
pub type FieldErrors = BTreeMap<String, String>;

/// A user-facing validation failure.
///
/// The `Display` output is the message shown to the shopper, so keep it short
/// and free of internal detail.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Field that failed, if the failure is about a single field.
    pub field: Option<&'static str>,
    /// Message shown to the client.
    pub message: String,
}

impl ValidationError {
    /// A failure not tied to one field.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// A failure on a specific field.
    #[must_use]
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            message: message.into(),
        }
    }
}

impl From<EmailError> for ValidationError {
    fn from(err: EmailError) -> Self {
        Self::field("email", err.to_string())
    }
}

impl From<RatingError> for ValidationError {
    fn from(err: RatingError) -> Self {
        Self::field("rating", err.to_string())
    }
}

impl From<SlugError> for ValidationError {
    fn from(err: SlugError) -> Self {
        Self::field("name", err.to_string())
    }
}

/// Trim a required text field, failing when it is absent or blank.
pub(crate) fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Reject text longer than `max` characters.
pub(crate) fn max_chars(
    field: &'static str,
    value: &str,
    max: usize,
    label: &str,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::field(
            field,
            format!("{label} cannot exceed {max} characters"),
        ));
    }
    Ok(())
}
