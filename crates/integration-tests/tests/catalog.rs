//! Product and category endpoints.

use reqwest::StatusCode;
use serde_json::{Value, json};
use whiskers_integration_tests::{TestApp, product};

fn names(body: &Value) -> Vec<String> {
    body["products"]
        .as_array()
        .expect("products array")
        .iter()
        .map(|p| p["name"].as_str().expect("name").to_owned())
        .collect()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = app
        .client
        .get(app.url("/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_derives_slug_and_stock() {
    let app = TestApp::spawn().await;

    let created = app
        .create_product(product("Plush Donut Bed", 39.99, "Beds & Furniture", 0))
        .await;
    assert_eq!(created["slug"], "plush-donut-bed");
    assert_eq!(created["categorySlug"], "beds-furniture");
    assert_eq!(created["inStock"], false);
    assert_eq!(created["reviewCount"], 0);

    let resp = app
        .client
        .post(app.api("/products"))
        .json(&product("Plush Donut Bed", 19.99, "Beds", 4))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "A product with this name already exists");
}

#[tokio::test]
async fn test_create_requires_fields() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.api("/products"))
        .json(&json!({ "name": "Half a product" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Missing required fields");

    let resp = app
        .client
        .post(app.api("/products"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_listing_filters_sorts_and_paginates() {
    let app = TestApp::spawn().await;
    app.create_product(product("Feather Wand", 15.99, "Toys", 10)).await;
    app.create_product(product("Catnip Mouse", 9.99, "Toys", 3)).await;
    app.create_product(product("Salmon Feast", 24.99, "Food", 40)).await;
    let mut featured = product("Donut Bed", 39.99, "Beds", 2);
    featured["isFeatured"] = json!(true);
    featured["tags"] = json!(["plush", "washable"]);
    app.create_product(featured).await;

    let body: Value = app
        .client
        .get(app.api("/products?category=toys&sortBy=price&sortOrder=asc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&body), ["Catnip Mouse", "Feather Wand"]);
    assert_eq!(body["pagination"]["total"], 2);

    let body: Value = app
        .client
        .get(app.api("/products?featured=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&body), ["Donut Bed"]);

    let body: Value = app
        .client
        .get(app.api("/products?search=washable"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&body), ["Donut Bed"]);

    let body: Value = app
        .client
        .get(app.api("/products?sortBy=price&sortOrder=desc&limit=3&page=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&body), ["Catnip Mouse"]);
    assert_eq!(
        body["pagination"],
        json!({ "page": 2, "limit": 3, "total": 4, "totalPages": 2 })
    );

    let resp = app
        .client
        .get(app.api("/products?sortBy=password"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = TestApp::spawn().await;
    let mut input = product("Window Perch", 29.99, "Beds", 5);
    input["imagePublicIds"] = json!(["cat-shop/products/perch"]);
    let created = app.create_product(input).await;
    let id = created["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.api(&format!("/products/{id}")))
        .json(&json!({ "name": "Window Perch Hammock", "stockCount": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Product updated successfully");
    assert_eq!(body["product"]["slug"], "window-perch-hammock");
    assert_eq!(body["product"]["inStock"], false);
    assert_eq!(body["product"]["price"], 29.99);

    let resp = app
        .client
        .delete(app.api(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(app.images.deleted(), ["cat-shop/products/perch"]);

    let resp = app
        .client
        .get(app.api(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Product not found");

    let resp = app
        .client
        .delete(app.api(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_counts() {
    let app = TestApp::spawn().await;
    app.create_product(product("Feather Wand", 15.99, "Toys", 10)).await;
    app.create_product(product("Catnip Mouse", 9.99, "Toys", 3)).await;
    app.create_product(product("Salmon Feast", 24.99, "Food & Treats", 40)).await;

    let body: Value = app
        .client
        .get(app.api("/categories/counts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 3);
    assert_eq!(
        body["categories"],
        json!([
            { "slug": "toys", "name": "Toys", "count": 2 },
            { "slug": "food-treats", "name": "Food & Treats", "count": 1 },
        ])
    );
}

#[tokio::test]
async fn test_fix_stock_reports_nothing_for_consistent_catalog() {
    let app = TestApp::spawn().await;
    app.create_product(product("Feather Wand", 15.99, "Toys", 0)).await;

    let body: Value = app
        .client
        .post(app.api("/products/fix-stock"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Stock status fixed for all products");
    assert_eq!(
        body["fixed"],
        json!({ "setToInStock": 0, "setToOutOfStock": 0 })
    );
}
