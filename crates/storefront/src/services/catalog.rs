//! Catalog operations that span the store and the image host.

use whiskers_core::{Product, ProductId};

use crate::db::{RepositoryError, Store};
use crate::services::images::ImageHost;

/// Delete a product's hosted images, then the product itself.
///
/// Image deletion is best-effort: a failure is logged and the product is
/// still removed.
///
/// # Errors
///
/// Returns `RepositoryError` if the product could not be loaded or deleted.
pub async fn delete_product(
    store: &dyn Store,
    images: &dyn ImageHost,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let Some(product) = store.get_product(id).await? else {
        return Ok(None);
    };

    for public_id in &product.image_public_ids {
        if let Err(e) = images.delete(public_id).await {
            tracing::warn!(
                product_id = %product.id,
                public_id = %public_id,
                error = %e,
                "Failed to delete product image"
            );
        }
    }

    let Some(product) = store.delete_product(id).await? else {
        return Ok(None);
    };

    tracing::info!(product_id = %product.id, slug = %product.slug, "Product deleted");
    Ok(Some(product))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use whiskers_core::ProductInput;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::images::{ImageHostError, ImageUpload, UploadedImage};

    #[derive(Default)]
    struct RecordingHost {
        deleted: Mutex<Vec<String>>,
        /// Whether the product was still stored at each delete call.
        product_present: Mutex<Vec<bool>>,
        watch: Option<(Arc<MemoryStore>, ProductId)>,
    }

    #[async_trait]
    impl ImageHost for RecordingHost {
        async fn upload(&self, _image: ImageUpload) -> Result<UploadedImage, ImageHostError> {
            Err(ImageHostError::NotConfigured)
        }

        async fn delete(&self, public_id: &str) -> Result<(), ImageHostError> {
            self.deleted.lock().unwrap().push(public_id.to_owned());
            if let Some((store, id)) = &self.watch {
                let present = store.get_product(*id).await.unwrap().is_some();
                self.product_present.lock().unwrap().push(present);
            }
            if public_id.ends_with("broken") {
                return Err(ImageHostError::Api {
                    status: 500,
                    message: "boom".to_owned(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_delete_product_removes_all_images() {
        let store = MemoryStore::new();
        let input: ProductInput = serde_json::from_value(serde_json::json!({
            "name": "Window Perch",
            "price": 39.0,
            "description": "Suction cup perch",
            "shortDescription": "Perch",
            "images": ["https://img.example/a.jpg", "https://img.example/b.jpg"],
            "imagePublicIds": ["cat-shop/products/broken", "cat-shop/products/b"],
            "category": "Furniture"
        }))
        .unwrap();
        let product = store
            .insert_product(input.into_new_product().unwrap())
            .await
            .unwrap();

        let host = RecordingHost::default();
        let deleted = delete_product(&store, &host, product.id).await.unwrap();

        assert_eq!(deleted.unwrap().id, product.id);
        assert_eq!(
            *host.deleted.lock().unwrap(),
            vec!["cat-shop/products/broken", "cat-shop/products/b"]
        );
        assert!(store.get_product(product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_images_deleted_before_record() {
        let store = Arc::new(MemoryStore::new());
        let input: ProductInput = serde_json::from_value(serde_json::json!({
            "name": "Sisal Post",
            "price": 19.5,
            "description": "Tall scratching post",
            "shortDescription": "Scratcher",
            "images": ["https://img.example/a.jpg", "https://img.example/b.jpg"],
            "imagePublicIds": ["cat-shop/products/a", "cat-shop/products/b"],
            "category": "Furniture"
        }))
        .unwrap();
        let product = store
            .insert_product(input.into_new_product().unwrap())
            .await
            .unwrap();

        let host = RecordingHost {
            watch: Some((Arc::clone(&store), product.id)),
            ..RecordingHost::default()
        };
        delete_product(&*store, &host, product.id).await.unwrap();

        assert_eq!(*host.product_present.lock().unwrap(), vec![true, true]);
        assert!(store.get_product(product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let store = MemoryStore::new();
        let host = RecordingHost::default();
        assert!(
            delete_product(&store, &host, ProductId::new(9))
                .await
                .unwrap()
                .is_none()
        );
        assert!(host.deleted.lock().unwrap().is_empty());
    }
}
