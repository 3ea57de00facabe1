//! The checkout wizard.
//!
//! A linear flow `shipping -> payment -> review -> complete`. Each forward step
//! validates its form and stays put with per-field errors when the form is
//! invalid. Going back is only allowed from payment to shipping and from
//! review to either earlier step. Completion is simulated: no payment is taken
//! and nothing is persisted beyond the confirmation itself.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartTotals, PricingPolicy};
use crate::types::looks_like_email;
use crate::validation::FieldErrors;

/// Well-known key the wizard state is stored under.
pub const CHECKOUT_STORAGE_KEY: &str = "whiskers-checkout";

const REQUIRED: &str = "Required";

/// Digits kept from a card number.
const CARD_DIGITS: usize = 16;

/// Where the shopper is in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Review,
    Complete,
}

impl CheckoutStep {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Payment => "payment",
            Self::Review => "review",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from wizard transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// The action belongs to a different step.
    #[error("Checkout is at the {current} step, expected {expected}")]
    WrongStep {
        expected: CheckoutStep,
        current: CheckoutStep,
    },

    /// The submitted form has field errors.
    #[error("Please correct the highlighted fields")]
    Invalid(FieldErrors),

    /// Orders need at least one item.
    #[error("Your cart is empty")]
    EmptyCart,

    /// Back transitions only go to an earlier step.
    #[error("Cannot go back from {from} to {to}")]
    InvalidBackTransition { from: CheckoutStep, to: CheckoutStep },
}

fn default_country() -> String {
    "United States".to_owned()
}

/// Shipping form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            apartment: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: default_country(),
        }
    }
}

impl ShippingAddress {
    /// Field errors for this form; empty when it is valid.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let mut require = |field: &str, value: &str| {
            if value.trim().is_empty() {
                errors.insert(field.to_owned(), REQUIRED.to_owned());
            }
        };

        require("firstName", &self.first_name);
        require("lastName", &self.last_name);
        require("email", &self.email);
        require("address", &self.address);
        require("city", &self.city);
        require("state", &self.state);
        require("zipCode", &self.zip_code);

        if !self.email.trim().is_empty() && !looks_like_email(self.email.trim()) {
            errors.insert("email".to_owned(), "Invalid email".to_owned());
        }

        errors
    }
}

/// Payment form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    pub card_number: String,
    pub card_name: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl PaymentInfo {
    /// Apply the as-you-type formatting to the card number and expiry.
    #[must_use]
    pub fn formatted(self) -> Self {
        Self {
            card_number: format_card_number(&self.card_number),
            expiry_date: format_expiry_date(&self.expiry_date),
            ..self
        }
    }

    /// Field errors for this form; empty when it is valid.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        let digits = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .count();
        if self.card_number.trim().is_empty() {
            errors.insert("cardNumber".to_owned(), REQUIRED.to_owned());
        } else if digits < CARD_DIGITS {
            errors.insert("cardNumber".to_owned(), "Invalid card number".to_owned());
        }
        if self.card_name.trim().is_empty() {
            errors.insert("cardName".to_owned(), REQUIRED.to_owned());
        }
        if self.expiry_date.trim().is_empty() {
            errors.insert("expiryDate".to_owned(), REQUIRED.to_owned());
        }
        if self.cvv.trim().is_empty() {
            errors.insert("cvv".to_owned(), REQUIRED.to_owned());
        }

        errors
    }
}

/// What the wizard keeps of an accepted payment form.
///
/// The full card number and the CVV are dropped as soon as the form passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub card_last_four: String,
    pub card_name: String,
    pub expiry_date: String,
}

impl From<&PaymentInfo> for PaymentSummary {
    fn from(info: &PaymentInfo) -> Self {
        let digits: Vec<char> = info.card_number.chars().filter(char::is_ascii_digit).collect();
        let last_four = digits
            .get(digits.len().saturating_sub(4)..)
            .unwrap_or_default()
            .iter()
            .collect();
        Self {
            card_last_four: last_four,
            card_name: info.card_name.trim().to_owned(),
            expiry_date: info.expiry_date.clone(),
        }
    }
}

impl PaymentSummary {
    /// Card number for display, e.g. `•••• •••• •••• 4242`.
    #[must_use]
    pub fn masked_card(&self) -> String {
        format!("•••• •••• •••• {}", self.card_last_four)
    }
}

/// Confirmation shown once an order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: String,
    pub email: String,
    pub item_count: u64,
    #[serde(flatten)]
    pub totals: CartTotals,
    pub placed_at: DateTime<Utc>,
}

/// Generate an order identifier of the form `WH-XXXXXX`.
pub fn generate_order_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let suffix: String = (0..6)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET.get(idx).map_or('0', |b| char::from(*b))
        })
        .collect();
    format!("WH-{suffix}")
}

/// One shopper's checkout progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutWizard {
    pub step: CheckoutStep,
    #[serde(default)]
    pub shipping: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSummary>,
    #[serde(default)]
    pub errors: FieldErrors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<OrderConfirmation>,
}

impl CheckoutWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep {
                expected,
                current: self.step,
            })
        }
    }

    /// Submit the shipping form, advancing to payment when it is valid.
    ///
    /// The form is kept either way so the shopper can correct it.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] outside the shipping step, or
    /// [`CheckoutError::Invalid`] with the field errors.
    pub fn submit_shipping(&mut self, address: ShippingAddress) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;

        self.errors = address.validate();
        self.shipping = address;
        if !self.errors.is_empty() {
            return Err(CheckoutError::Invalid(self.errors.clone()));
        }

        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Submit the payment form, advancing to review when it is valid.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] outside the payment step, or
    /// [`CheckoutError::Invalid`] with the field errors.
    pub fn submit_payment(&mut self, payment: PaymentInfo) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;

        let payment = payment.formatted();
        self.errors = payment.validate();
        if !self.errors.is_empty() {
            return Err(CheckoutError::Invalid(self.errors.clone()));
        }

        self.payment = Some(PaymentSummary::from(&payment));
        self.step = CheckoutStep::Review;
        Ok(())
    }

    /// Return to an earlier step.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidBackTransition`] unless going from payment to
    /// shipping, or from review to payment or shipping.
    pub fn back(&mut self, to: CheckoutStep) -> Result<(), CheckoutError> {
        let allowed = matches!(
            (self.step, to),
            (CheckoutStep::Payment, CheckoutStep::Shipping)
                | (
                    CheckoutStep::Review,
                    CheckoutStep::Payment | CheckoutStep::Shipping
                )
        );
        if !allowed {
            return Err(CheckoutError::InvalidBackTransition {
                from: self.step,
                to,
            });
        }

        self.errors.clear();
        self.step = to;
        Ok(())
    }

    /// Place the order for the given cart.
    ///
    /// The caller clears the cart once this succeeds.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] outside the review step, or
    /// [`CheckoutError::EmptyCart`].
    pub fn place_order<R: Rng + ?Sized>(
        &mut self,
        cart: &Cart,
        policy: &PricingPolicy,
        rng: &mut R,
    ) -> Result<OrderConfirmation, CheckoutError> {
        self.expect_step(CheckoutStep::Review)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let confirmation = OrderConfirmation {
            order_id: generate_order_id(rng),
            email: self.shipping.email.trim().to_lowercase(),
            item_count: cart.item_count(),
            totals: cart.totals(policy),
            placed_at: Utc::now(),
        };

        self.step = CheckoutStep::Complete;
        self.errors.clear();
        self.confirmation = Some(confirmation.clone());
        Ok(confirmation)
    }

    /// Start over from the shipping step.
    pub fn restart(&mut self) {
        *self = Self::default();
    }
}

/// Keep at most 16 digits and group them by four.
///
/// Fewer than four digits are returned as typed.
#[must_use]
pub fn format_card_number(value: &str) -> String {
    let digits: Vec<char> = value
        .chars()
        .filter(char::is_ascii_digit)
        .take(CARD_DIGITS)
        .collect();
    if digits.len() < 4 {
        return digits.into_iter().collect();
    }

    digits
        .chunks(4)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format digits as `MM/YY`.
#[must_use]
pub fn format_expiry_date(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 2 {
        return digits;
    }
    let (month, rest) = digits.split_at(2);
    let year: String = rest.chars().take(2).collect();
    format!("{month}/{year}")
}
