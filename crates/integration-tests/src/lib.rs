//! Integration tests for the Whiskers storefront API.
//!
//! Each test spawns the full router on an ephemeral port with the in-memory
//! store, an in-memory session store and a recording image host, then talks
//! to it over HTTP with a cookie-keeping client, the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p whiskers-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tower_sessions::MemoryStore as MemorySessionStore;
use whiskers_storefront::config::StorefrontConfig;
use whiskers_storefront::db::{MemoryStore, Store};
use whiskers_storefront::services::images::{
    ImageHost, ImageHostError, ImageUpload, UploadedImage,
};
use whiskers_storefront::state::AppState;

/// Image host that records calls instead of talking to Cloudinary.
#[derive(Debug, Default)]
pub struct FakeImageHost {
    uploads: Mutex<Vec<(String, String)>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeImageHost {
    /// `(folder, content type)` of every upload so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Public IDs deleted so far.
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, ImageHostError> {
        let public_id = format!("cat-shop/{}/{}", image.folder, image.file_name);
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((image.folder, image.content_type));
        Ok(UploadedImage {
            url: format!("https://res.example/{public_id}"),
            public_id,
            width: 800,
            height: 600,
            format: "webp".to_owned(),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), ImageHostError> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(public_id.to_owned());
        Ok(())
    }
}

/// A running storefront plus a client bound to one shopper session.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
    pub images: Arc<FakeImageHost>,
}

impl TestApp {
    /// Start the storefront on `127.0.0.1:0`.
    ///
    /// # Panics
    ///
    /// Panics if the listener can not be bound.
    pub async fn spawn() -> Self {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "WHISKERS_STORE" => Some("memory".to_owned()),
            "WHISKERS_CHECKOUT_LATENCY_MS" => Some("0".to_owned()),
            _ => None,
        })
        .expect("test configuration is valid");

        let store = Arc::new(MemoryStore::new());
        let images = Arc::new(FakeImageHost::default());
        let state = AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::clone(&images) as Arc<dyn ImageHost>,
        );
        let app = whiskers_storefront::app(state, MemorySessionStore::default(), false);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        Self {
            addr,
            client: Self::new_client(),
            store,
            images,
        }
    }

    /// A fresh client with its own cookie jar, i.e. a second shopper.
    ///
    /// # Panics
    ///
    /// Panics if the client can not be built.
    #[must_use]
    pub fn new_client() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Absolute URL for an API path such as `/products`.
    #[must_use]
    pub fn api(&self, path: &str) -> String {
        format!("http://{}/api/v1{path}", self.addr)
    }

    /// Absolute URL for a path outside the API.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Create a product through the API and return its JSON.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or is rejected.
    pub async fn create_product(&self, body: Value) -> Value {
        let resp = self
            .client
            .post(self.api("/products"))
            .json(&body)
            .send()
            .await
            .expect("create product request");
        assert_eq!(resp.status(), 201, "create product rejected");
        let body: Value = resp.json().await.expect("create product body");
        body["product"].clone()
    }
}

/// Minimal valid product payload.
#[must_use]
pub fn product(name: &str, price: f64, category: &str, stock_count: i64) -> Value {
    json!({
        "name": name,
        "price": price,
        "description": format!("{name} for discerning cats"),
        "shortDescription": name,
        "images": [format!("https://img.example/{}.jpg", name.len())],
        "category": category,
        "stockCount": stock_count,
    })
}
