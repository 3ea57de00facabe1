//! Catalog records and the rules that derive their computed fields.
//!
//! Two fields are never taken from input:
//!
//! - `slug` / `category_slug` are always [`slugify`](crate::slugify) of
//!   `name` / `category`
//! - `in_stock` is always `stock_count > 0`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ProductId, Slug, SortOrder, VariantKind};
use crate::validation::{ValidationError, max_chars, required};

/// Longest accepted product name.
pub const MAX_NAME_CHARS: usize = 200;
/// Longest accepted short description.
pub const MAX_SHORT_DESCRIPTION_CHARS: usize = 300;
/// Largest price the `NUMERIC(10,2)` columns can hold.
/// 99_999_999.99 (mantissa 9_999_999_999 split into 32-bit parts, scale 2).
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Stock flag derived from the stock count.
#[must_use]
pub const fn in_stock(stock_count: i32) -> bool {
    stock_count > 0
}

/// One selectable value on a variant axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOption {
    pub value: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price_modifier: Decimal,
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

/// A named option axis such as size or flavor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VariantKind,
    #[serde(default)]
    pub options: Vec<VariantOption>,
}

const fn default_true() -> bool {
    true
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<Decimal>,
    pub description: String,
    pub short_description: String,
    pub images: Vec<String>,
    pub image_public_ids: Vec<String>,
    pub category: String,
    pub category_slug: Slug,
    pub tags: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    pub review_count: i32,
    pub in_stock: bool,
    pub stock_count: i32,
    pub variants: Vec<ProductVariant>,
    pub features: Vec<String>,
    pub is_featured: bool,
    pub is_new_arrival: bool,
    pub is_bestseller: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Sum of the price modifiers for a variant selection.
    ///
    /// Selections map a variant axis name to one of its option values.
    ///
    /// # Errors
    ///
    /// Returns a validation error if an axis or value does not exist.
    pub fn price_adjustment(
        &self,
        selections: &BTreeMap<String, String>,
    ) -> Result<Decimal, ValidationError> {
        selections
            .iter()
            .try_fold(Decimal::ZERO, |acc, (axis, value)| {
                let option = self
                    .variants
                    .iter()
                    .find(|v| &v.name == axis)
                    .and_then(|v| v.options.iter().find(|o| &o.value == value))
                    .ok_or_else(|| {
                        ValidationError::field(
                            "variants",
                            format!("Unknown option {value:?} for {axis:?}"),
                        )
                    })?;
                Ok(acc.saturating_add(option.price_modifier))
            })
    }

    /// Whether any search term appears in the name, description or tags.
    ///
    /// Matching is case-insensitive and any single term is enough.
    #[must_use]
    pub fn matches_search(&self, search: &str) -> bool {
        let haystack = format!(
            "{} {} {}",
            self.name,
            self.description,
            self.tags.join(" ")
        )
        .to_lowercase();

        search
            .split_whitespace()
            .map(str::to_lowercase)
            .any(|term| haystack.contains(&term))
    }
}

/// Product payload as sent by the admin dashboard.
///
/// Every field is optional here so that missing fields produce a validation
/// message rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_patch_decimal")]
    pub original_price: Option<Option<Decimal>>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub images: Option<Vec<String>>,
    pub image_public_ids: Option<Vec<String>>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub stock_count: Option<i64>,
    pub variants: Option<Vec<ProductVariant>>,
    pub features: Option<Vec<String>>,
    /// Accepted for compatibility; the derived rule always wins.
    pub in_stock: Option<bool>,
    pub is_featured: Option<bool>,
    #[serde(alias = "isNew")]
    pub is_new_arrival: Option<bool>,
    pub is_bestseller: Option<bool>,
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn deserialize_patch_decimal<'de, D>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error>
where
    D: Deserializer<'de>,
{
    rust_decimal::serde::float_option::deserialize(deserializer).map(Some)
}

/// A validated product ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub slug: Slug,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub description: String,
    pub short_description: String,
    pub images: Vec<String>,
    pub image_public_ids: Vec<String>,
    pub category: String,
    pub category_slug: Slug,
    pub tags: Vec<String>,
    pub stock_count: i32,
    pub in_stock: bool,
    pub variants: Vec<ProductVariant>,
    pub features: Vec<String>,
    pub is_featured: bool,
    pub is_new_arrival: bool,
    pub is_bestseller: bool,
}

/// A validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<Slug>,
    pub price: Option<Decimal>,
    pub original_price: Option<Option<Decimal>>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub images: Option<Vec<String>>,
    pub image_public_ids: Option<Vec<String>>,
    pub category: Option<String>,
    pub category_slug: Option<Slug>,
    pub tags: Option<Vec<String>>,
    pub stock_count: Option<i32>,
    pub in_stock: Option<bool>,
    pub variants: Option<Vec<ProductVariant>>,
    pub features: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_new_arrival: Option<bool>,
    pub is_bestseller: Option<bool>,
}

impl ProductInput {
    /// Validate a create request and derive the computed fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing required fields, an empty image
    /// list, out-of-range numbers, or over-long text.
    pub fn into_new_product(self) -> Result<NewProduct, ValidationError> {
        let (Some(name), Some(price), Some(description), Some(short_description), Some(category)) = (
            required(self.name),
            self.price,
            required(self.description),
            required(self.short_description),
            required(self.category),
        ) else {
            return Err(ValidationError::new("Missing required fields"));
        };

        let images = self.images.unwrap_or_default();
        if images.is_empty() {
            return Err(ValidationError::field(
                "images",
                "At least one image is required",
            ));
        }

        validate_name(&name)?;
        validate_price(price)?;
        max_chars(
            "shortDescription",
            &short_description,
            MAX_SHORT_DESCRIPTION_CHARS,
            "Short description",
        )?;
        let original_price = self.original_price.flatten();
        if let Some(original) = original_price {
            validate_original_price(original)?;
        }
        let stock_count = validate_stock_count(self.stock_count.unwrap_or(0))?;

        Ok(NewProduct {
            slug: Slug::from_name(&name)?,
            category_slug: category_slug(&category)?,
            name,
            price,
            original_price,
            description,
            short_description,
            images,
            image_public_ids: self.image_public_ids.unwrap_or_default(),
            category,
            tags: self.tags.unwrap_or_default(),
            stock_count,
            in_stock: in_stock(stock_count),
            variants: self.variants.unwrap_or_default(),
            features: self.features.unwrap_or_default(),
            is_featured: self.is_featured.unwrap_or(false),
            is_new_arrival: self.is_new_arrival.unwrap_or(true),
            is_bestseller: self.is_bestseller.unwrap_or(false),
        })
    }

    /// Validate an update request; only supplied fields are checked.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any supplied field is invalid.
    pub fn into_update(self) -> Result<ProductUpdate, ValidationError> {
        let mut update = ProductUpdate::default();

        if let Some(name) = self.name {
            let name = name.trim().to_owned();
            if name.is_empty() {
                return Err(ValidationError::field("name", "Product name is required"));
            }
            validate_name(&name)?;
            update.slug = Some(Slug::from_name(&name)?);
            update.name = Some(name);
        }
        if let Some(price) = self.price {
            validate_price(price)?;
            update.price = Some(price);
        }
        if let Some(original_price) = self.original_price {
            if let Some(original) = original_price {
                validate_original_price(original)?;
            }
            update.original_price = Some(original_price);
        }
        if let Some(short_description) = self.short_description {
            max_chars(
                "shortDescription",
                &short_description,
                MAX_SHORT_DESCRIPTION_CHARS,
                "Short description",
            )?;
            update.short_description = Some(short_description);
        }
        if let Some(images) = self.images {
            if images.is_empty() {
                return Err(ValidationError::field(
                    "images",
                    "At least one image is required",
                ));
            }
            update.images = Some(images);
        }
        if let Some(category) = self.category {
            let category = category.trim().to_owned();
            update.category_slug = Some(category_slug(&category)?);
            update.category = Some(category);
        }
        if let Some(stock_count) = self.stock_count {
            let stock_count = validate_stock_count(stock_count)?;
            update.stock_count = Some(stock_count);
            update.in_stock = Some(in_stock(stock_count));
        }

        update.description = self.description;
        update.image_public_ids = self.image_public_ids;
        update.tags = self.tags;
        update.variants = self.variants;
        update.features = self.features;
        update.is_featured = self.is_featured;
        update.is_new_arrival = self.is_new_arrival;
        update.is_bestseller = self.is_bestseller;

        Ok(update)
    }
}

impl ProductUpdate {
    /// Apply the supplied fields to a stored product.
    pub fn apply_to(self, product: &mut Product) {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    product.$field = value;
                })*
            };
        }

        set!(
            name,
            slug,
            price,
            original_price,
            description,
            short_description,
            images,
            image_public_ids,
            category,
            category_slug,
            tags,
            stock_count,
            in_stock,
            variants,
            features,
            is_featured,
            is_new_arrival,
            is_bestseller,
        );
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    max_chars("name", name, MAX_NAME_CHARS, "Product name")
}

fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::field("price", "Price must be greater than 0"));
    }
    if price > MAX_PRICE {
        return Err(ValidationError::field("price", "Price is too large"));
    }
    Ok(())
}

fn validate_original_price(price: Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::field(
            "originalPrice",
            "Original price cannot be negative",
        ));
    }
    if price > MAX_PRICE {
        return Err(ValidationError::field(
            "originalPrice",
            "Original price is too large",
        ));
    }
    Ok(())
}

fn validate_stock_count(stock_count: i64) -> Result<i32, ValidationError> {
    i32::try_from(stock_count)
        .ok()
        .filter(|count| *count >= 0)
        .ok_or_else(|| ValidationError::field("stockCount", "Stock count cannot be negative"))
}

fn category_slug(category: &str) -> Result<Slug, ValidationError> {
    Slug::from_name(category).map_err(|_| {
        ValidationError::field("category", "Category must contain a letter or digit")
    })
}

// =============================================================================
// Listing
// =============================================================================

/// Fields a product listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    #[default]
    CreatedAt,
    Price,
    Rating,
    Name,
    ReviewCount,
    StockCount,
}

impl ProductSort {
    /// Column backing this sort key.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::Name => "name",
            Self::ReviewCount => "review_count",
            Self::StockCount => "stock_count",
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "price" => Ok(Self::Price),
            "rating" => Ok(Self::Rating),
            "name" => Ok(Self::Name),
            "reviewCount" => Ok(Self::ReviewCount),
            "stockCount" => Ok(Self::StockCount),
            other => Err(ValidationError::field(
                "sortBy",
                format!("Invalid sortBy: {other}"),
            )),
        }
    }
}

/// A product listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Category slug, already lowercased.
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured_only: bool,
    /// Product slug, already lowercased.
    pub slug: Option<String>,
    pub page: crate::listing::PageRequest,
    pub sort_by: ProductSort,
    pub sort_order: SortOrder,
}

impl ProductQuery {
    /// Whether a product passes every filter (pagination aside).
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.slug
            .as_deref()
            .is_none_or(|slug| product.slug.as_str() == slug)
            && self
                .category
                .as_deref()
                .is_none_or(|category| product.category_slug.as_str() == category)
            && (!self.featured_only || product.is_featured)
            && self
                .search
                .as_deref()
                .is_none_or(|search| product.matches_search(search))
    }

    /// Order two products according to the requested sort.
    #[must_use]
    pub fn compare(&self, a: &Product, b: &Product) -> std::cmp::Ordering {
        let ordering = match self.sort_by {
            ProductSort::CreatedAt => a.created_at.cmp(&b.created_at),
            ProductSort::Price => a.price.cmp(&b.price),
            ProductSort::Rating => a.rating.cmp(&b.rating),
            ProductSort::Name => a.name.cmp(&b.name),
            ProductSort::ReviewCount => a.review_count.cmp(&b.review_count),
            ProductSort::StockCount => a.stock_count.cmp(&b.stock_count),
        }
        .then_with(|| a.id.cmp(&b.id));

        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Number of products in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub slug: String,
    pub name: String,
    pub count: i64,
}

/// Outcome of re-deriving `in_stock` across the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRepair {
    pub set_to_in_stock: u64,
    pub set_to_out_of_stock: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_product(id: i32, name: &str, price: Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            slug: Slug::from_name(name).unwrap(),
            price,
            original_price: None,
            description: format!("{name} description"),
            short_description: name.to_owned(),
            images: vec![format!("https://img.example/{id}.jpg")],
            image_public_ids: vec![format!("cat-shop/products/{id}")],
            category: "Cat Food".to_owned(),
            category_slug: Slug::from_name("Cat Food").unwrap(),
            tags: vec!["food".to_owned()],
            rating: Decimal::ZERO,
            review_count: 0,
            in_stock: true,
            stock_count: 10,
            variants: vec![ProductVariant {
                name: "Size".to_owned(),
                kind: VariantKind::Size,
                options: vec![
                    VariantOption {
                        value: "Small".to_owned(),
                        price_modifier: Decimal::ZERO,
                        in_stock: true,
                    },
                    VariantOption {
                        value: "Large".to_owned(),
                        price_modifier: Decimal::new(250, 2),
                        in_stock: true,
                    },
                ],
            }],
            features: vec![],
            is_featured: false,
            is_new_arrival: true,
            is_bestseller: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn valid_input() -> ProductInput {
        serde_json::from_value(serde_json::json!({
            "name": "Organic Salmon Feast!",
            "price": 24.99,
            "description": "Wild salmon pate.",
            "shortDescription": "Salmon pate",
            "images": ["https://img.example/salmon.jpg"],
            "category": "Wet Food",
            "stockCount": 12,
            "inStock": false,
            "isNew": false
        }))
        .unwrap()
    }

    #[test]
    fn test_create_derives_slugs_and_stock() {
        let product = valid_input().into_new_product().unwrap();
        assert_eq!(product.slug.as_str(), "organic-salmon-feast");
        assert_eq!(product.category_slug.as_str(), "wet-food");
        assert_eq!(product.price, Decimal::new(2499, 2));
        // explicit inStock is ignored
        assert!(product.in_stock);
        assert!(!product.is_new_arrival);
        assert!(!product.is_featured);
    }

    #[test]
    fn test_create_zero_stock_is_out_of_stock() {
        let mut input = valid_input();
        input.stock_count = None;
        input.in_stock = Some(true);
        let product = input.into_new_product().unwrap();
        assert_eq!(product.stock_count, 0);
        assert!(!product.in_stock);
    }

    #[test]
    fn test_create_missing_fields() {
        let mut input = valid_input();
        input.description = Some("   ".into());
        let err = input.into_new_product().unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields");
    }

    #[test]
    fn test_create_requires_image() {
        let mut input = valid_input();
        input.images = Some(vec![]);
        let err = input.into_new_product().unwrap_err();
        assert_eq!(err.to_string(), "At least one image is required");
    }

    #[test]
    fn test_create_rejects_negative_stock_and_long_name() {
        let mut input = valid_input();
        input.stock_count = Some(-1);
        assert!(input.into_new_product().is_err());

        let mut input = valid_input();
        input.name = Some("x".repeat(201));
        assert_eq!(input.into_new_product().unwrap_err().field, Some("name"));
    }

    #[test]
    fn test_create_rejects_price_beyond_column() {
        let mut input = valid_input();
        input.price = Some(MAX_PRICE);
        assert!(input.into_new_product().is_ok());

        let mut input = valid_input();
        input.price = Some(Decimal::new(i64::MAX, 0));
        assert_eq!(input.into_new_product().unwrap_err().field, Some("price"));

        let mut input = valid_input();
        input.original_price = Some(Some(MAX_PRICE + Decimal::ONE));
        assert_eq!(
            input.into_new_product().unwrap_err().field,
            Some("originalPrice")
        );
    }

    #[test]
    fn test_price_accepts_integer_and_float() {
        let input: ProductInput =
            serde_json::from_value(serde_json::json!({ "price": 12.5 })).unwrap();
        assert_eq!(input.price, Some(Decimal::new(125, 1)));

        let input: ProductInput =
            serde_json::from_value(serde_json::json!({ "price": 12 })).unwrap();
        assert_eq!(input.price, Some(Decimal::new(12, 0)));
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: ProductInput = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(absent.original_price, None);

        let cleared: ProductInput =
            serde_json::from_value(serde_json::json!({ "originalPrice": null })).unwrap();
        assert_eq!(cleared.original_price, Some(None));
    }

    #[test]
    fn test_update_rederives_slug_and_stock() {
        let mut product = sample_product(1, "Tuna Treats", Decimal::new(5, 0));
        let update: ProductInput = serde_json::from_value(serde_json::json!({
            "name": "Tuna Treats Deluxe",
            "category": "Treats & Snacks",
            "stockCount": 0,
            "inStock": true,
            "originalPrice": null
        }))
        .unwrap();

        update.into_update().unwrap().apply_to(&mut product);

        assert_eq!(product.slug.as_str(), "tuna-treats-deluxe");
        assert_eq!(product.category_slug.as_str(), "treats-snacks");
        assert_eq!(product.stock_count, 0);
        assert!(!product.in_stock);
        assert_eq!(product.original_price, None);
        // untouched
        assert_eq!(product.price, Decimal::new(5, 0));
    }

    #[test]
    fn test_price_adjustment() {
        let product = sample_product(1, "Cat Bed", Decimal::new(30, 0));
        let mut selection = BTreeMap::new();
        selection.insert("Size".to_owned(), "Large".to_owned());
        assert_eq!(
            product.price_adjustment(&selection).unwrap(),
            Decimal::new(250, 2)
        );

        selection.insert("Size".to_owned(), "Huge".to_owned());
        assert!(product.price_adjustment(&selection).is_err());

        assert_eq!(
            product.price_adjustment(&BTreeMap::new()).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_matches_search_any_term() {
        let product = sample_product(1, "Feather Wand", Decimal::ONE);
        assert!(product.matches_search("wand"));
        assert!(product.matches_search("laser FEATHER"));
        assert!(product.matches_search("food"));
        assert!(!product.matches_search("salmon"));
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("price".parse::<ProductSort>().unwrap(), ProductSort::Price);
        assert!("password".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_product_serializes_camel_case_numbers() {
        let product = sample_product(3, "Laser Pointer", Decimal::new(999, 2));
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"], serde_json::json!(9.99));
        assert_eq!(json["categorySlug"], "cat-food");
        assert_eq!(json["variants"][0]["type"], "size");
        assert!(json.get("originalPrice").is_none());
    }
}
