//! Session cart and checkout wizard.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use whiskers_integration_tests::{TestApp, product};

fn assert_money(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap_or(f64::NAN);
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {value}"
    );
}

async fn get(client: &Client, url: String) -> Value {
    client.get(url).send().await.unwrap().json().await.unwrap()
}

async fn post(client: &Client, url: String, body: Value) -> (StatusCode, Value) {
    let resp = client.post(url).json(&body).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

fn shipping() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Purrington",
        "email": "Ada@Example.com",
        "phone": "555-0100",
        "address": "1 Catnip Lane",
        "city": "Portland",
        "state": "OR",
        "zipCode": "97201",
    })
}

fn payment() -> Value {
    json!({
        "cardNumber": "4242424242424242",
        "cardName": "Ada Purrington",
        "expiryDate": "1228",
        "cvv": "123",
    })
}

/// Two products: $10 and $25.
async fn stock_shelves(app: &TestApp) -> (i64, i64) {
    let wand = app
        .create_product(product("Feather Wand", 10.0, "Toys", 20))
        .await["id"]
        .as_i64()
        .unwrap();
    let bed = app
        .create_product(product("Donut Bed", 25.0, "Beds", 5))
        .await["id"]
        .as_i64()
        .unwrap();
    (wand, bed)
}

#[tokio::test]
async fn test_cart_totals_below_free_shipping() {
    let app = TestApp::spawn().await;
    let (wand, bed) = stock_shelves(&app).await;

    let (status, _) = post(
        &app.client,
        app.api("/cart/items"),
        json!({ "productId": wand, "quantity": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = post(&app.client, app.api("/cart/items"), json!({ "productId": bed })).await;

    let cart = &body["cart"];
    assert_eq!(cart["itemCount"], 3);
    assert_money(&cart["subtotal"], 45.0);
    assert_money(&cart["shipping"], 5.99);
    assert_money(&cart["tax"], 3.6);
    assert_money(&cart["total"], 54.59);

    // The cart survives across requests on the same session.
    let body = get(&app.client, app.api("/cart")).await;
    assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 2);

    // A different shopper starts empty.
    let other = TestApp::new_client();
    let body = get(&other, app.api("/cart")).await;
    assert_eq!(body["cart"]["itemCount"], 0);
    assert_money(&body["cart"]["shipping"], 0.0);
}

#[tokio::test]
async fn test_cart_quantity_updates_and_removal() {
    let app = TestApp::spawn().await;
    let (wand, bed) = stock_shelves(&app).await;
    post(&app.client, app.api("/cart/items"), json!({ "productId": wand })).await;
    post(&app.client, app.api("/cart/items"), json!({ "productId": bed })).await;

    let body = get(&app.client, app.api(&format!("/cart/items/{bed}"))).await;
    assert_eq!(body["inCart"], true);

    let body: Value = app
        .client
        .patch(app.api(&format!("/cart/items/{wand}")))
        .json(&json!({ "quantity": 3 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // 3 x 10 + 25 = 55: free shipping
    assert_money(&body["cart"]["subtotal"], 55.0);
    assert_money(&body["cart"]["shipping"], 0.0);

    let body: Value = app
        .client
        .patch(app.api(&format!("/cart/items/{wand}")))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["cart"]["itemCount"], 1);

    app.client
        .delete(app.api(&format!("/cart/items/{bed}")))
        .send()
        .await
        .unwrap();
    let body = get(&app.client, app.api(&format!("/cart/items/{bed}"))).await;
    assert_eq!(body["inCart"], false);

    post(&app.client, app.api("/cart/items"), json!({ "productId": bed })).await;
    let body: Value = app
        .client
        .delete(app.api("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["cart"]["items"], json!([]));
}

#[tokio::test]
async fn test_cart_variants_and_rejections() {
    let app = TestApp::spawn().await;
    let mut food = product("Salmon Feast", 24.99, "Food", 45);
    food["variants"] = json!([{
        "name": "Size",
        "type": "size",
        "options": [
            { "value": "2 lb", "priceModifier": 0 },
            { "value": "5 lb", "priceModifier": 15 },
        ],
    }]);
    let id = app.create_product(food).await["id"].as_i64().unwrap();

    let (_, body) = post(
        &app.client,
        app.api("/cart/items"),
        json!({ "productId": id, "variants": { "Size": "5 lb" } }),
    )
    .await;
    let (_, body2) = post(
        &app.client,
        app.api("/cart/items"),
        json!({ "productId": id, "variants": { "Size": "2 lb" } }),
    )
    .await;
    assert_eq!(body["cart"]["items"][0]["selectedVariants"]["Size"], "5 lb");
    assert_eq!(body2["cart"]["items"].as_array().unwrap().len(), 2);
    // 39.99 + 24.99
    assert_money(&body2["cart"]["subtotal"], 64.98);

    let (status, body) = post(
        &app.client,
        app.api("/cart/items"),
        json!({ "productId": id, "variants": { "Size": "50 lb" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = post(
        &app.client,
        app.api("/cart/items"),
        json!({ "productId": id + 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn test_checkout_happy_path() {
    let app = TestApp::spawn().await;
    let (wand, bed) = stock_shelves(&app).await;
    post(
        &app.client,
        app.api("/cart/items"),
        json!({ "productId": wand, "quantity": 2 }),
    )
    .await;
    post(&app.client, app.api("/cart/items"), json!({ "productId": bed })).await;

    let body = get(&app.client, app.api("/checkout")).await;
    assert_eq!(body["checkout"]["step"], "shipping");
    assert_eq!(body["checkout"]["shipping"]["country"], "United States");
    assert_money(&body["cart"]["total"], 54.59);

    let (status, body) = post(&app.client, app.api("/checkout/shipping"), shipping()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checkout"]["step"], "payment");

    let (status, body) = post(&app.client, app.api("/checkout/payment"), payment()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checkout"]["step"], "review");
    assert_eq!(body["checkout"]["payment"]["cardLastFour"], "4242");
    assert!(body["checkout"]["payment"].get("cvv").is_none());

    let (status, body) = post(&app.client, app.api("/checkout/place-order"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let confirmation = &body["confirmation"];
    assert!(confirmation["orderId"].as_str().unwrap().starts_with("WH-"));
    assert_eq!(confirmation["email"], "ada@example.com");
    assert_eq!(confirmation["itemCount"], 3);
    assert_money(&confirmation["total"], 54.59);
    assert_eq!(body["checkout"]["step"], "complete");

    let body = get(&app.client, app.api("/cart")).await;
    assert_eq!(body["cart"]["itemCount"], 0);

    let body: Value = app
        .client
        .delete(app.api("/checkout"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["checkout"]["step"], "shipping");
}

#[tokio::test]
async fn test_checkout_rejected_transitions() {
    let app = TestApp::spawn().await;

    let (status, _) = post(&app.client, app.api("/checkout/payment"), payment()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app.client,
        app.api("/checkout/shipping"),
        json!({ "firstName": "Ada", "email": "not-an-email" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["zipCode"], "Required");
    assert_eq!(body["errors"]["email"], "Invalid email");

    // The rejected form is kept for correction.
    let body = get(&app.client, app.api("/checkout")).await;
    assert_eq!(body["checkout"]["step"], "shipping");
    assert_eq!(body["checkout"]["shipping"]["firstName"], "Ada");
    assert_eq!(body["checkout"]["errors"]["zipCode"], "Required");

    post(&app.client, app.api("/checkout/shipping"), shipping()).await;
    let (status, _) = post(
        &app.client,
        app.api("/checkout/back"),
        json!({ "to": "review" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app.client,
        app.api("/checkout/payment"),
        json!({ "cardNumber": "4242", "cardName": "Ada" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["cardNumber"], "Invalid card number");
    assert_eq!(body["errors"]["cvv"], "Required");

    post(&app.client, app.api("/checkout/payment"), payment()).await;
    let (status, body) = post(
        &app.client,
        app.api("/checkout/back"),
        json!({ "to": "shipping" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checkout"]["step"], "shipping");
    assert_eq!(body["checkout"]["shipping"]["city"], "Portland");

    post(&app.client, app.api("/checkout/shipping"), shipping()).await;
    post(&app.client, app.api("/checkout/payment"), payment()).await;
    let (status, body) = post(&app.client, app.api("/checkout/place-order"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Your cart is empty");
}

#[tokio::test]
async fn test_cart_survives_extreme_price_and_quantity() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.api("/products"))
        .json(&product("Gold Bowl", 1e20, "Bowls", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Price is too large");

    let bowl = app
        .create_product(product("Gold Bowl", 99_999_999.0, "Bowls", 1))
        .await["id"]
        .as_i64()
        .unwrap();
    let (status, _) = post(&app.client, app.api("/cart/items"), json!({ "productId": bowl })).await;
    assert_eq!(status, StatusCode::OK);

    let resp = app
        .client
        .patch(app.api(&format!("/cart/items/{bowl}")))
        .json(&json!({ "quantity": 10_000_000_000_i64 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["cart"]["items"][0]["quantity"], u32::MAX);
    assert_money(&body["cart"]["shipping"], 0.0);
}
