//! Integration tests for the cached export endpoints.
//!
//! Run with: cargo test -p kiosk-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::json;

use kiosk_integration_tests::{base_url, staff_credentials};

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
    assert!(resp.status().is_redirection());

    client
}

#[tokio::test]
#[ignore = "Requires running kiosk-web server and database"]
async fn test_products_export_snapshot_is_stable_within_ttl() {
    let client = staff_client().await;

    // Warm the snapshot
    let first = client
        .get(format!("{}/shop/products/export/", base_url()))
        .send()
        .await
        .expect("Failed to fetch export")
        .text()
        .await
        .expect("Failed to read export");

    // Change the underlying data inside the TTL window
    let resp = client
        .post(format!("{}/shop/api/products/", base_url()))
        .json(&json!({"name": "Mid-window Product", "price": "2.00", "quantity": 1}))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);

    // The second read returns the identical stored payload
    let second = client
        .get(format!("{}/shop/products/export/", base_url()))
        .send()
        .await
        .expect("Failed to fetch export")
        .text()
        .await
        .expect("Failed to read export");

    assert_eq!(first, second);
    assert!(!second.contains("Mid-window Product"));
}

#[tokio::test]
#[ignore = "Requires running kiosk-web server and database"]
async fn test_user_orders_export_unknown_user_is_404() {
    let resp = Client::new()
        .get(format!("{}/shop/users/99999999/orders/export/", base_url()))
        .send()
        .await
        .expect("Failed to fetch export");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running kiosk-web server and database"]
async fn test_feed_lists_latest_articles() {
    let resp = Client::new()
        .get(format!("{}/blog/articles/latest/feed/", base_url()))
        .send()
        .await
        .expect("Failed to fetch feed");

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/rss+xml"));

    let body = resp.text().await.expect("Failed to read feed");
    assert!(body.contains("<rss version=\"2.0\">"));
    assert!(body.contains("<channel>"));
}
