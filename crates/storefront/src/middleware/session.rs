//! Shopper sessions.
//!
//! The cart and the checkout wizard live in the session record, keyed by the
//! well-known storage keys from `whiskers_core`. The store behind the layer
//! is `PostgreSQL` in production and in-process for the memory backend.

use tower_sessions::session::Error as SessionError;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use whiskers_core::{CART_STORAGE_KEY, CHECKOUT_STORAGE_KEY, Cart, CartStorage, CheckoutWizard};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "whiskers_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer over the given store.
///
/// # Arguments
///
/// * `store` - Where session records are kept
/// * `secure` - Whether the cookie is restricted to HTTPS
#[must_use]
pub fn create_session_layer<S>(store: S, secure: bool) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Cart storage backed by the shopper's session.
#[derive(Debug, Clone)]
pub struct SessionCartStorage {
    session: Session,
}

impl SessionCartStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartStorage for SessionCartStorage {
    type Error = SessionError;

    async fn load(&self) -> Result<Option<Cart>, Self::Error> {
        match self.session.get::<Cart>(CART_STORAGE_KEY).await {
            Ok(cart) => Ok(cart),
            // A cart written by an older build is dropped rather than failing every request.
            Err(SessionError::SerdeJson(e)) => {
                tracing::warn!(error = %e, "Discarding unreadable cart");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, cart: &Cart) -> Result<(), Self::Error> {
        self.session.insert(CART_STORAGE_KEY, cart).await
    }
}

/// Load the shopper's checkout wizard, starting fresh if there is none.
///
/// # Errors
///
/// Returns the session store error.
pub async fn load_checkout(session: &Session) -> Result<CheckoutWizard, SessionError> {
    match session.get::<CheckoutWizard>(CHECKOUT_STORAGE_KEY).await {
        Ok(wizard) => Ok(wizard.unwrap_or_default()),
        Err(SessionError::SerdeJson(e)) => {
            tracing::warn!(error = %e, "Discarding unreadable checkout state");
            Ok(CheckoutWizard::default())
        }
        Err(e) => Err(e),
    }
}

/// Persist the shopper's checkout wizard.
///
/// # Errors
///
/// Returns the session store error.
pub async fn save_checkout(session: &Session, wizard: &CheckoutWizard) -> Result<(), SessionError> {
    session.insert(CHECKOUT_STORAGE_KEY, wizard).await
}
