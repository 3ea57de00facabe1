//! Product image hosting.
//!
//! Images are stored on Cloudinary under `cat-shop/<folder>` and resized on
//! upload. Catalog records keep the returned URL and public id; deleting a
//! product deletes its images best-effort.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use whiskers_core::{ValidationError, slugify};

use crate::config::CloudinaryConfig;

/// Cloudinary API base URL.
const BASE_URL: &str = "https://api.cloudinary.com";

/// Every uploaded image lives under this folder.
const ROOT_FOLDER: &str = "cat-shop";

/// Folder used when the upload names none.
pub const DEFAULT_FOLDER: &str = "products";

/// Resize to fit 800x800, automatic quality and format.
const UPLOAD_TRANSFORMATION: &str = "c_limit,h_800,w_800/q_auto:good/f_auto";

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image content types.
pub const ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/jpeg", "image/jpg", "image/png", "image/webp", "image/gif"];

/// Errors that can occur when talking to the image host.
#[derive(Debug, Error)]
pub enum ImageHostError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No credentials were configured.
    #[error("image hosting is not configured")]
    NotConfigured,
}

/// An image received from the admin dashboard.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    /// Sub-folder under `cat-shop/`, already normalized.
    pub folder: String,
}

impl ImageUpload {
    /// Check type and size, and normalize the folder name.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unsupported types or files over 5 MiB.
    pub fn new(
        bytes: Vec<u8>,
        file_name: Option<String>,
        content_type: Option<String>,
        folder: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let content_type = content_type.unwrap_or_default().to_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(ValidationError::field(
                "file",
                "Invalid file type. Allowed: JPEG, PNG, WebP, GIF",
            ));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::field("file", "File size exceeds 5MB limit"));
        }

        let folder = folder.map(slugify).filter(|f| !f.is_empty());

        Ok(Self {
            bytes,
            file_name: file_name.unwrap_or_else(|| "upload".to_owned()),
            content_type,
            folder: folder.unwrap_or_else(|| DEFAULT_FOLDER.to_owned()),
        })
    }
}

/// A hosted image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Image hosting port.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, ImageHostError>;

    /// Delete an image; deleting a missing image succeeds.
    async fn delete(&self, public_id: &str) -> Result<(), ImageHostError>;
}

/// Used when no image host credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledImageHost;

#[async_trait]
impl ImageHost for DisabledImageHost {
    async fn upload(&self, _image: ImageUpload) -> Result<UploadedImage, ImageHostError> {
        Err(ImageHostError::NotConfigured)
    }

    async fn delete(&self, public_id: &str) -> Result<(), ImageHostError> {
        tracing::warn!(public_id, "Image hosting not configured, skipping delete");
        Ok(())
    }
}

/// Cloudinary upload API client.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    width: u32,
    height: u32,
    format: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryClient {
    /// Create a new Cloudinary client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CloudinaryConfig) -> Result<Self, ImageHostError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_owned(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// Point the client at a different API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1_1/{}/image/{action}", self.base_url, self.cloud_name)
    }

    /// Add `timestamp`, `api_key` and the signature to a form.
    fn signed_form(&self, params: BTreeMap<&'static str, String>) -> Form {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut params = params;
        params.insert("timestamp", timestamp);
        let signature = sign(&params, self.api_secret.expose_secret());

        params
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn send(&self, action: &str, form: Form) -> Result<reqwest::Response, ImageHostError> {
        let response = self
            .client
            .post(self.endpoint(action))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ImageHostError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    #[tracing::instrument(skip(self, image), fields(folder = %image.folder, size = image.bytes.len()))]
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, ImageHostError> {
        let params = BTreeMap::from([
            ("folder", format!("{ROOT_FOLDER}/{}", image.folder)),
            ("transformation", UPLOAD_TRANSFORMATION.to_owned()),
        ]);
        let file = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = self.signed_form(params).part("file", file);

        let uploaded: UploadResponse = self
            .send("upload", form)
            .await?
            .json()
            .await
            .map_err(|e| ImageHostError::Parse(e.to_string()))?;

        tracing::info!(public_id = %uploaded.public_id, "Image uploaded");

        Ok(UploadedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            width: uploaded.width,
            height: uploaded.height,
            format: uploaded.format,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, public_id: &str) -> Result<(), ImageHostError> {
        let form = self.signed_form(BTreeMap::from([("public_id", public_id.to_owned())]));

        let destroyed: DestroyResponse = self
            .send("destroy", form)
            .await?
            .json()
            .await
            .map_err(|e| ImageHostError::Parse(e.to_string()))?;

        match destroyed.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(ImageHostError::Api {
                status: 200,
                message: format!("unexpected destroy result: {other}"),
            }),
        }
    }
}

/// Hex SHA-256 of `k1=v1&k2=v2...` (keys sorted) followed by the secret.
fn sign(params: &BTreeMap<&str, String>, secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
