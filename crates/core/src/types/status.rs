//! Small closed vocabularies shared across the shop.

use serde::{Deserialize, Serialize};

/// Triage status of a contact message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "message_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    New,
    Read,
    Replied,
}

/// Topic picked on the contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactSubject {
    #[serde(rename = "Order Status")]
    OrderStatus,
    #[serde(rename = "Product Inquiry")]
    ProductInquiry,
    #[serde(rename = "Returns & Exchanges")]
    ReturnsAndExchanges,
    #[serde(rename = "Wholesale")]
    Wholesale,
    #[serde(rename = "Other")]
    Other,
}

impl ContactSubject {
    /// All subjects, in form order.
    pub const ALL: [Self; 5] = [
        Self::OrderStatus,
        Self::ProductInquiry,
        Self::ReturnsAndExchanges,
        Self::Wholesale,
        Self::Other,
    ];

    /// Label shown on the form and stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderStatus => "Order Status",
            Self::ProductInquiry => "Product Inquiry",
            Self::ReturnsAndExchanges => "Returns & Exchanges",
            Self::Wholesale => "Wholesale",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for ContactSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContactSubject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|subject| subject.as_str() == s)
            .ok_or_else(|| format!("invalid subject: {s}"))
    }
}

/// Axis a product variant varies along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Size,
    Color,
    Flavor,
}

/// Direction of a listing sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}
