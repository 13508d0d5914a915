//! Integration tests for the product CRUD and archive lifecycle.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The web server running (cargo run -p kiosk-web)
//! - A staff user matching `KIOSK_TEST_STAFF_USERNAME` / `_PASSWORD`
//!
//! Run with: cargo test -p kiosk-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use kiosk_integration_tests::{base_url, staff_credentials};

/// Create an HTTP client with a logged-in staff session.
async fn staff_client() -> Client {
    let client = Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client");

    let (username, password) = staff_credentials();
    let resp = client
        .post(format!("{}/auth/login/", base_url()))
        .form(&[("username", username.as_str()), ("password", password.as_str())])
        .send()
        .await
        .expect("Failed to log in");
    assert!(
        resp.status().is_redirection(),
        "staff login failed: {}",
        resp.status()
    );

    client
}

/// Create a product via the API, returning its JSON representation.
async fn create_product(client: &Client, name: &str, price: &str, quantity: i32) -> Value {
    let resp = client
        .post(format!("{}/shop/api/products/", base_url()))
        .json(&json!({
            "name": name,
            "description": format!("{name} for integration tests"),
            "price": price,
            "quantity": quantity,
        }))
        .send()
        .await
        .expect("Failed to create product");

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse product body")
}

#[tokio::test]
#[ignore = "Requires running kiosk-web server and database"]
async fn test_product_create_appears_in_listing() {
    let client = staff_client().await;

    let product = create_product(&client, "IT Listing Widget", "9.99", 5).await;
    let id = product["id"].as_i64().expect("product id");

    let body = client
        .get(format!("{}/shop/products/", base_url()))
        .send()
        .await
        .expect("Failed to fetch listing")
        .text()
        .await
        .expect("Failed to read listing");

    assert!(body.contains("IT Listing Widget"));

    let resp = client
        .get(format!("{}/shop/products/{id}/", base_url()))
        .send()
        .await
        .expect("Failed to fetch detail");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running kiosk-web server and database"]
async fn test_archive_hides_but_keeps_addressable() {
    let client = staff_client().await;

    let product = create_product(&client, "IT Archive Widget", "5.00", 1).await;
    let id = product["id"].as_i64().expect("product id");

    // Archive via the form endpoint
    let resp = client
        .post(format!("{}/shop/products/{id}/archive/", base_url()))
        .send()
        .await
        .expect("Failed to archive");
    assert!(resp.status().is_redirection());

    // Excluded from the default listing
    let listing = client
        .get(format!("{}/shop/products/", base_url()))
        .send()
        .await
        .expect("Failed to fetch listing")
        .text()
        .await
        .expect("Failed to read listing");
    assert!(!listing.contains("IT Archive Widget"));

    // Still addressable by id
    let resp = client
        .get(format!("{}/shop/products/{id}/", base_url()))
        .send()
        .await
        .expect("Failed to fetch detail");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running kiosk-web server and database"]
async fn test_api_validation_errors_are_field_level() {
    let client = staff_client().await;

    let resp = client
        .post(format!("{}/shop/api/products/", base_url()))
        .json(&json!({
            "name": "",
            "price": "-1.00",
            "quantity": -5,
        }))
        .send()
        .await
        .expect("Failed to post invalid product");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error body");
    let errors = body["errors"].as_array().expect("errors array");
    let fields: Vec<&str> = errors
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"price"));
    assert!(fields.contains(&"quantity"));
}

#[tokio::test]
#[ignore = "Requires running kiosk-web server and database"]
async fn test_detail_of_missing_product_is_404() {
    let resp = Client::new()
        .get(format!("{}/shop/products/99999999/", base_url()))
        .send()
        .await
        .expect("Failed to fetch detail");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running kiosk-web server and database"]
async fn test_mutations_require_staff() {
    // Anonymous API create is rejected
    let resp = Client::new()
        .post(format!("{}/shop/api/products/", base_url()))
        .json(&json!({"name": "X", "price": "1.00", "quantity": 1}))
        .send()
        .await
        .expect("Failed to post");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Anonymous form create redirects to login
    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client");
    let resp = client
        .get(format!("{}/shop/products/create/", base_url()))
        .send()
        .await
        .expect("Failed to get create form");
    assert!(resp.status().is_redirection());
}
