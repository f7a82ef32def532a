//! Integration tests for the Konvy storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database, migrate, and run the server
//! cargo run -p konvy-cli -- migrate
//! cargo run -p konvy-storefront
//!
//! # Run integration tests (ignored by default)
//! KONVY_ADMIN_PASSWORD=... cargo test -p konvy-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `proxies` - Catalog/checkout proxy CORS and failure shapes
//! - `auth` - Registration and login validation
//! - `dashboard` - Redemption and customer chat
//! - `admin` - Order issuing, fulfillment and owner access

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps the session cookie between requests.
///
/// Each client claims its own `X-Forwarded-For` address so the credential
/// rate limiter counts it separately from the rest of the suite.
#[must_use]
pub fn client() -> Client {
    client_from(&random_client_ip())
}

/// Like [`client`], but presenting a fixed client address.
#[must_use]
pub fn client_from(ip: &str) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(ip).expect("valid client address"),
    );
    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// An address in 10.0.0.0/8 unlikely to repeat across a run.
#[must_use]
pub fn random_client_ip() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2])
}

/// A username that will not collide across test runs.
#[must_use]
pub fn unique_username(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..10])
}

/// A code that will not collide across test runs.
#[must_use]
pub fn unique_code() -> String {
    format!("T{}", &Uuid::new_v4().simple().to_string()[..12]).to_uppercase()
}

pub async fn post_json(client: &Client, path: &str, body: &Value) -> Response {
    client
        .post(format!("{}{path}", base_url()))
        .json(body)
        .send()
        .await
        .expect("request failed")
}

pub async fn get(client: &Client, path: &str) -> Response {
    client
        .get(format!("{}{path}", base_url()))
        .send()
        .await
        .expect("request failed")
}

/// Status and JSON body of a response.
pub async fn read(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

/// Register a fresh customer; the returned client is logged in as them.
pub async fn customer() -> (Client, String) {
    let client = client();
    let username = unique_username("cust");
    let (status, body) = read(
        post_json(
            &client,
            "/api/auth/register",
            &json!({
                "username": username,
                "password": "hunter22",
                "confirmPassword": "hunter22",
            }),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "registration failed: {body}");
    (client, username)
}

/// A client logged in as the owner, using `KONVY_ADMIN_PASSWORD`.
pub async fn owner() -> Client {
    let password = std::env::var("KONVY_ADMIN_PASSWORD")
        .expect("KONVY_ADMIN_PASSWORD must be set for admin integration tests");
    let client = client();
    let (status, body) = read(
        post_json(&client, "/api/admin/login", &json!({ "password": password })).await,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "owner login failed: {body}");
    assert_eq!(body["user"]["role"], "owner");
    client
}
