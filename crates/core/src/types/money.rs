//! Decimal money helpers.
//!
//! Prices are plain [`Decimal`] amounts in US dollars. All derived amounts are
//! rounded to cents with round-half-up, which for the non-negative amounts a
//! shop deals with is `MidpointAwayFromZero`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to whole cents (round-half-up).
///
/// ```
/// use rust_decimal::Decimal;
/// use whiskers_core::round_cents;
///
/// assert_eq!(round_cents(Decimal::new(3_605, 3)), Decimal::new(361, 2)); // 3.605 -> 3.61
/// assert_eq!(round_cents(Decimal::new(3_604, 3)), Decimal::new(360, 2)); // 3.604 -> 3.60
/// ```
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round an amount to one decimal place (round-half-up), as used for ratings.
#[must_use]
pub fn round_tenths(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display, e.g. `$19.99`.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", round_cents(amount))
}
