//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use whiskers_core::PricingPolicy;

use crate::config::StorefrontConfig;
use crate::db::Store;
use crate::services::images::ImageHost;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the catalog store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn Store>,
    images: Arc<dyn ImageHost>,
    pricing: PricingPolicy,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Catalog, review and inbox persistence
    /// * `images` - Image host used by uploads and product deletes
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn Store>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                images,
                pricing: PricingPolicy::default(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the persistence backend.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the image host.
    #[must_use]
    pub fn images(&self) -> &dyn ImageHost {
        self.inner.images.as_ref()
    }

    /// Shipping and tax rules applied to carts.
    #[must_use]
    pub fn pricing(&self) -> &PricingPolicy {
        &self.inner.pricing
    }

    /// Simulated order processing delay.
    #[must_use]
    pub fn checkout_latency(&self) -> Duration {
        self.inner.config.checkout_latency
    }
}
