//! Page-based pagination shared by the listing endpoints.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Requested page and page size, both already validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Largest page size any listing accepts.
    pub const MAX_LIMIT: u32 = 100;

    /// Build a page request, applying `default_limit` when none was given.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `limit` is outside `1..=100` or `page`
    /// is zero.
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        default_limit: u32,
    ) -> Result<Self, ValidationError> {
        let limit = limit.unwrap_or(default_limit);
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(ValidationError::field(
                "limit",
                format!("Limit must be between 1 and {}", Self::MAX_LIMIT),
            ));
        }
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ValidationError::field("page", "Page must be at least 1"));
        }
        Ok(Self { page, limit })
    }

    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Rows to skip before this page.
    #[must_use]
    pub fn offset(self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.limit)
    }

    /// Slice one page out of an already filtered and sorted list.
    #[must_use]
    pub fn slice<T: Clone>(self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .iter()
            .skip(start)
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Pagination metadata for a result set of `total` rows.
    #[must_use]
    pub fn paginate(self, total: u64) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total.div_ceil(u64::from(self.limit)),
        }
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}
