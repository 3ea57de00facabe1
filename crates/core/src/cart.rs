//! Cart line items and the totals derived from them.
//!
//! A [`Cart`] is a plain serializable value. Every mutation goes through the
//! methods here and totals are always recomputed from the lines, never stored.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{ProductId, Slug, round_cents};

/// Shipping and tax rules applied to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Subtotals at or above this ship for free.
    pub free_shipping_threshold: Decimal,
    /// Flat shipping fee below the threshold.
    pub flat_shipping: Decimal,
    /// Fraction of the subtotal charged as tax.
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(50, 0),
            flat_shipping: Decimal::new(599, 2),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

/// The product fields a cart line keeps, captured when the line is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub in_stock: bool,
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            image: product.images.first().cloned(),
            in_stock: product.in_stock,
        }
    }
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: CartProduct,
    pub quantity: u32,
    /// Chosen option per variant axis, ordered by axis name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selected_variants: BTreeMap<String, String>,
    /// Sum of the chosen options' price modifiers.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price_adjustment: Decimal,
}

impl CartItem {
    /// Price of one unit including variant modifiers.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.product.price.saturating_add(self.price_adjustment)
    }

    /// Unrounded price of the whole line, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price().saturating_mul(Decimal::from(self.quantity))
    }

    fn same_line(&self, id: ProductId, variants: &BTreeMap<String, String>) -> bool {
        self.product.id == id && &self.selected_variants == variants
    }
}

/// Derived money figures for a cart, each rounded to cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Compute the totals for a list of lines.
///
/// An empty list yields all-zero totals. Otherwise shipping is free once the
/// subtotal reaches the threshold, tax is a flat rate on the subtotal, and the
/// total is rounded from the unrounded parts.
#[must_use]
pub fn calculate(items: &[CartItem], policy: &PricingPolicy) -> CartTotals {
    if items.is_empty() {
        return CartTotals::default();
    }

    let subtotal = items
        .iter()
        .map(CartItem::line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let shipping = if subtotal >= policy.free_shipping_threshold {
        Decimal::ZERO
    } else {
        policy.flat_shipping
    };
    let tax = subtotal.saturating_mul(policy.tax_rate);

    CartTotals {
        subtotal: round_cents(subtotal),
        shipping: round_cents(shipping),
        tax: round_cents(tax),
        total: round_cents(subtotal.saturating_add(shipping).saturating_add(tax)),
    }
}

/// The lines of one shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` units of a product with the given variant selection.
    ///
    /// A line with the same product and selection is incremented; any other
    /// selection gets its own line. Adding zero units does nothing.
    pub fn add(
        &mut self,
        product: CartProduct,
        quantity: u32,
        selected_variants: BTreeMap<String, String>,
        price_adjustment: Decimal,
    ) {
        if quantity == 0 {
            return;
        }

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.same_line(product.id, &selected_variants))
        {
            line.quantity = line.quantity.saturating_add(quantity);
            return;
        }

        self.items.push(CartItem {
            product,
            quantity,
            selected_variants,
            price_adjustment,
        });
    }

    /// Drop every line for a product. Returns whether anything was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product.id != id);
        self.items.len() != before
    }

    /// Set the quantity of every line for a product; below 1 removes them.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        let Ok(quantity) = u32::try_from(quantity.min(i64::from(u32::MAX))) else {
            self.remove(id);
            return;
        };
        if quantity == 0 {
            self.remove(id);
            return;
        }

        for line in self.items.iter_mut().filter(|line| line.product.id == id) {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|line| line.product.id == id)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn totals(&self, policy: &PricingPolicy) -> CartTotals {
        calculate(&self.items, policy)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: i32, price: Decimal) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            slug: Slug::from_trusted(format!("product-{id}")),
            price,
            image: None,
            in_stock: true,
        }
    }

    fn no_variants() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn size(value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("Size".to_owned(), value.to_owned())])
    }

    #[test]
    fn test_scenario_below_free_shipping() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::new(10, 0)), 2, no_variants(), Decimal::ZERO);
        cart.add(product(2, Decimal::new(25, 0)), 1, no_variants(), Decimal::ZERO);

        let totals = cart.totals(&PricingPolicy::default());
        assert_eq!(totals.subtotal, Decimal::new(4500, 2));
        assert_eq!(totals.shipping, Decimal::new(599, 2));
        assert_eq!(totals.tax, Decimal::new(360, 2));
        assert_eq!(totals.total, Decimal::new(5459, 2));
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::MAX), 1, no_variants(), Decimal::ONE);
        cart.add(product(2, Decimal::new(99_999_999, 0)), 1, no_variants(), Decimal::ZERO);
        cart.update_quantity(ProductId::new(1), 10_000_000_000);
        cart.update_quantity(ProductId::new(2), 10_000_000_000);

        let totals = cart.totals(&PricingPolicy::default());
        assert_eq!(totals.subtotal, Decimal::MAX);
        assert_eq!(totals.shipping, Decimal::ZERO);
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::new(50, 0)), 1, no_variants(), Decimal::ZERO);
        let totals = cart.totals(&PricingPolicy::default());
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(5400, 2));

        cart.clear();
        cart.add(product(2, Decimal::new(4999, 2)), 1, no_variants(), Decimal::ZERO);
        assert_eq!(
            cart.totals(&PricingPolicy::default()).shipping,
            Decimal::new(599, 2)
        );
    }

    #[test]
    fn test_total_is_rounded_sum_of_parts() {
        let policy = PricingPolicy::default();
        for (price, qty) in [(1999, 3), (333, 7), (1, 1), (4999, 1), (12345, 2)] {
            let mut cart = Cart::new();
            cart.add(product(1, Decimal::new(price, 2)), qty, no_variants(), Decimal::ZERO);
            let t = cart.totals(&policy);
            assert_eq!(t.total, round_cents(t.subtotal + t.shipping + t.tax));
            assert_eq!(t.shipping.is_zero(), t.subtotal >= Decimal::new(50, 0));
        }
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.08 * 10.5625 = 0.845
        let items = [CartItem {
            product: product(1, Decimal::new(105_625, 4)),
            quantity: 1,
            selected_variants: BTreeMap::new(),
            price_adjustment: Decimal::ZERO,
        }];
        assert_eq!(
            calculate(&items, &PricingPolicy::default()).tax,
            Decimal::new(85, 2)
        );
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        assert_eq!(
            Cart::new().totals(&PricingPolicy::default()),
            CartTotals::default()
        );
    }

    #[test]
    fn test_add_existing_increments() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::ONE), 1, no_variants(), Decimal::ZERO);
        cart.add(product(1, Decimal::ONE), 2, no_variants(), Decimal::ZERO);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::ONE), 0, no_variants(), Decimal::ZERO);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_different_variants_get_separate_lines() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::new(30, 0)), 1, size("Small"), Decimal::ZERO);
        cart.add(product(1, Decimal::new(30, 0)), 1, size("Large"), Decimal::new(250, 2));
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].selected_variants["Size"], "Small");
        assert_eq!(cart.items()[1].unit_price(), Decimal::new(3250, 2));
        assert_eq!(cart.item_count(), 2);

        // product-id operations cover both lines
        assert!(cart.contains(ProductId::new(1)));
        cart.update_quantity(ProductId::new(1), 4);
        assert_eq!(cart.item_count(), 8);
        assert!(cart.remove(ProductId::new(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::ONE), 3, no_variants(), Decimal::ZERO);
        cart.add(product(2, Decimal::ONE), 1, no_variants(), Decimal::ZERO);
        cart.update_quantity(ProductId::new(1), 0);
        assert!(!cart.contains(ProductId::new(1)));
        assert!(cart.contains(ProductId::new(2)));

        cart.update_quantity(ProductId::new(2), -5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_is_idempotent() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::ONE), 1, no_variants(), Decimal::ZERO);
        cart.update_quantity(ProductId::new(1), 7);
        let once = cart.clone();
        cart.update_quantity(ProductId::new(1), 7);
        assert_eq!(cart, once);
        assert_eq!(cart.items()[0].quantity, 7);
    }

    #[test]
    fn test_update_unknown_product_is_noop() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::ONE), 1, no_variants(), Decimal::ZERO);
        let before = cart.clone();
        cart.update_quantity(ProductId::new(99), 3);
        assert_eq!(cart, before);
        assert!(!cart.remove(ProductId::new(99)));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut cart = Cart::new();
        cart.add(product(1, Decimal::new(1299, 2)), 2, size("Large"), Decimal::new(250, 2));
        cart.add(product(2, Decimal::new(5, 0)), 1, no_variants(), Decimal::ZERO);

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);

        let value = serde_json::to_value(&cart).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["selectedVariants"]["Size"], "Large");
        assert_eq!(value[0]["product"]["price"], serde_json::json!(12.99));
    }
}
