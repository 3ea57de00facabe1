//! A shopper's cart bound to a storage port.
//!
//! [`CartSession`] loads the cart once when it is hydrated and writes it back
//! after every mutation. Hydrating never writes, so an empty initial cart can
//! not clobber what is already stored.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::cart::{Cart, CartItem, CartProduct, CartTotals, PricingPolicy};
use crate::catalog::Product;
use crate::types::ProductId;
use crate::validation::ValidationError;

/// Well-known key the serialized cart is stored under.
pub const CART_STORAGE_KEY: &str = "whiskers-cart";

/// Durable storage for one shopper's cart.
pub trait CartStorage {
    type Error;

    /// Read the stored cart, if any.
    fn load(&self) -> impl Future<Output = Result<Option<Cart>, Self::Error>> + Send;

    /// Replace the stored cart.
    fn save(&self, cart: &Cart) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug)]
pub enum CartSessionError<E> {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Storage(E),
}

/// Cart contents plus the derived totals, as shown to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub item_count: u64,
    #[serde(flatten)]
    pub totals: CartTotals,
}

/// A cart loaded from storage.
#[derive(Debug)]
pub struct CartSession<S> {
    storage: S,
    cart: Cart,
    policy: PricingPolicy,
}

impl<S> CartSession<S>
where
    S: CartStorage + Send + Sync,
{
    /// Load the stored cart, starting empty if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the cart can not be read.
    pub async fn hydrate(storage: S, policy: PricingPolicy) -> Result<Self, S::Error> {
        let cart = storage.load().await?.unwrap_or_default();
        Ok(Self {
            storage,
            cart,
            policy,
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.cart.totals(&self.policy)
    }

    #[must_use]
    pub fn is_in_cart(&self, id: ProductId) -> bool {
        self.cart.contains(id)
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            items: self.cart.items().to_vec(),
            item_count: self.item_count(),
            totals: self.totals(),
        }
    }

    /// Add a product with an optional variant selection.
    ///
    /// # Errors
    ///
    /// Fails if the selection names an unknown variant option, or if the
    /// cart can not be saved.
    pub async fn add(
        &mut self,
        product: &Product,
        quantity: u32,
        variants: BTreeMap<String, String>,
    ) -> Result<(), CartSessionError<S::Error>> {
        let adjustment = product.price_adjustment(&variants)?;
        self.cart
            .add(CartProduct::from(product), quantity, variants, adjustment);
        self.persist().await
    }

    /// Remove every line for a product.
    ///
    /// # Errors
    ///
    /// Fails if the cart can not be saved.
    pub async fn remove(&mut self, id: ProductId) -> Result<(), CartSessionError<S::Error>> {
        self.cart.remove(id);
        self.persist().await
    }

    /// Set a product's quantity; anything below 1 removes it.
    ///
    /// # Errors
    ///
    /// Fails if the cart can not be saved.
    pub async fn update_quantity(
        &mut self,
        id: ProductId,
        quantity: i64,
    ) -> Result<(), CartSessionError<S::Error>> {
        self.cart.update_quantity(id, quantity);
        self.persist().await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Fails if the cart can not be saved.
    pub async fn clear(&mut self) -> Result<(), CartSessionError<S::Error>> {
        self.cart.clear();
        self.persist().await
    }

    async fn persist(&self) -> Result<(), CartSessionError<S::Error>> {
        self.storage
            .save(&self.cart)
            .await
            .map_err(CartSessionError::Storage)
    }
}

/// Process-local cart storage.
///
/// Clones share the same slot, so a test can keep a handle and inspect what
/// a session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    slot: Arc<Mutex<Option<Cart>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds a cart.
    #[must_use]
    pub fn with_cart(cart: Cart) -> Self {
        let storage = Self::default();
        *storage.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(cart);
        storage
    }

    /// The cart as last saved.
    #[must_use]
    pub fn stored(&self) -> Option<Cart> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times the cart has been saved.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CartStorage for MemoryCartStorage {
    type Error = std::convert::Infallible;

    async fn load(&self) -> Result<Option<Cart>, Self::Error> {
        Ok(self.stored())
    }

    async fn save(&self, cart: &Cart) -> Result<(), Self::Error> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(cart.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
