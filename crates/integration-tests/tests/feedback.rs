//! Reviews, contact messages and newsletter signups.

use reqwest::StatusCode;
use serde_json::{Value, json};
use whiskers_integration_tests::{TestApp, product};

fn review(product_id: i64, rating: i64) -> Value {
    json!({
        "productId": product_id,
        "author": "Mochi's human",
        "email": "Mochi@Example.com",
        "rating": rating,
        "title": "Approved by the cat",
        "content": "She refuses to leave it.",
    })
}

#[tokio::test]
async fn test_reviews_update_product_rating() {
    let app = TestApp::spawn().await;
    let id = app
        .create_product(product("Heated Cat Mat", 34.99, "Beds", 12))
        .await["id"]
        .as_i64()
        .unwrap();

    for rating in [5, 4, 4] {
        let resp = app
            .client
            .post(app.api("/reviews"))
            .json(&review(id, rating))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Review submitted successfully");
        assert_eq!(body["review"]["email"], "mochi@example.com");
    }

    let body: Value = app
        .client
        .get(app.api(&format!("/reviews?productId={id}&sortBy=rating&sortOrder=asc")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // 13 / 3 = 4.33
    assert_eq!(body["stats"], json!({ "averageRating": 4.3, "totalReviews": 3 }));
    let ratings: Vec<i64> = body["reviews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["rating"].as_i64().unwrap())
        .collect();
    assert_eq!(ratings, [4, 4, 5]);

    let body: Value = app
        .client
        .get(app.api(&format!("/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["product"]["rating"], 4.3);
    assert_eq!(body["product"]["reviewCount"], 3);
}

#[tokio::test]
async fn test_review_rejections() {
    let app = TestApp::spawn().await;
    let id = app
        .create_product(product("Heated Cat Mat", 34.99, "Beds", 12))
        .await["id"]
        .as_i64()
        .unwrap();

    let resp = app
        .client
        .post(app.api("/reviews"))
        .json(&review(id, 6))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .post(app.api("/reviews"))
        .json(&json!({ "productId": id, "rating": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "All fields are required");

    let resp = app
        .client
        .post(app.api("/reviews"))
        .json(&review(id + 100, 5))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.client.get(app.api("/reviews")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Product ID is required");
}

#[tokio::test]
async fn test_deleting_product_drops_its_reviews() {
    let app = TestApp::spawn().await;
    let id = app
        .create_product(product("Heated Cat Mat", 34.99, "Beds", 12))
        .await["id"]
        .as_i64()
        .unwrap();
    app.client
        .post(app.api("/reviews"))
        .json(&review(id, 5))
        .send()
        .await
        .unwrap();

    app.client
        .delete(app.api(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();

    let body: Value = app
        .client
        .get(app.api(&format!("/reviews?productId={id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["stats"]["totalReviews"], 0);
    assert_eq!(body["reviews"], json!([]));
}

#[tokio::test]
async fn test_contact_message() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.api("/messages"))
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Purrington",
            "email": "ada@example.com",
            "subject": "Order Status",
            "message": "Where is my scratching post?",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Your message has been sent successfully!");
    assert_eq!(body["data"]["status"], "new");
    assert_eq!(body["data"]["subject"], "Order Status");

    let resp = app
        .client
        .post(app.api("/messages"))
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Purrington",
            "email": "ada@example.com",
            "subject": "Order Status",
            "message": "Hi",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["errors"]["message"],
        "Message must be at least 10 characters long"
    );

    let resp = app
        .client
        .post(app.api("/messages"))
        .json(&json!({ "firstName": "Ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "All fields are required");
}

#[tokio::test]
async fn test_newsletter_subscription() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.api("/subscribers"))
        .json(&json!({ "email": "Kitty@Example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Successfully subscribed!");

    let resp = app
        .client
        .post(app.api("/subscribers"))
        .json(&json!({ "email": "kitty@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "This email is already subscribed!");

    let resp = app
        .client
        .post(app.api("/subscribers"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Email is required");
}
