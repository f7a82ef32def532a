//! Owner dashboard tests.
//!
//! These tests require the storefront server, a migrated database and
//! `KONVY_ADMIN_PASSWORD` matching the server's configuration.

use konvy_integration_tests::{client, customer, get, owner, post_json, read, unique_code};
use konvy_core::OrderCode;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_wrong_admin_password() {
    let (status, body) = read(
        post_json(
            &client(),
            "/api/admin/login",
            &json!({ "password": "definitely-not-it" }),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid admin password");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_customers_cannot_reach_admin_api() {
    let (client, _) = customer().await;
    let (status, _) = read(get(&client, "/api/admin/orders").await).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_owner_cannot_use_customer_dashboard() {
    let owner = owner().await;

    for path in ["/api/dashboard/chat", "/api/dashboard/orders"] {
        let (status, body) = read(get(&owner, path).await).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(body["error"], "Customer account required");
    }

    let (status, _) = read(
        post_json(&owner, "/api/dashboard/redeem", &json!({ "code": unique_code() })).await,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_generated_code_shape() {
    let admin = owner().await;
    let (status, body) = read(get(&admin, "/api/admin/orders/generate-code").await).await;
    assert_eq!(status, StatusCode::OK);

    let code = body["code"].as_str().unwrap();
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(OrderCode::parse(code).unwrap().as_str(), code);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_duplicate_code_is_rejected_case_insensitively() {
    let admin = owner().await;
    let code = unique_code();

    let (status, body) = read(
        post_json(
            &admin,
            "/api/admin/orders",
            &json!({ "productName": "OG Account", "orderCode": code }),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["order"]["owner_id"].is_null());

    let (status, body) = read(
        post_json(
            &admin,
            "/api/admin/orders",
            &json!({ "productName": "Other", "orderCode": code.to_lowercase() }),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "Order ID already exists. Please use a different ID."
    );
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_blank_fields_are_rejected() {
    let admin = owner().await;
    let (status, body) = read(
        post_json(
            &admin,
            "/api/admin/orders",
            &json!({ "productName": " ", "orderCode": "ABC" }),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please fill in all fields");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_issued_code_is_claimed_then_fulfilled_once() {
    let admin = owner().await;
    let (customer, _) = customer().await;
    let code = unique_code();

    let (_, body) = read(
        post_json(
            &admin,
            "/api/admin/orders",
            &json!({ "productName": "Stacked Account", "orderCode": code }),
        )
        .await,
    )
    .await;
    let order_id = body["order"]["id"].as_i64().unwrap();

    let (status, body) =
        read(post_json(&customer, "/api/dashboard/redeem", &json!({ "code": code })).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["id"].as_i64(), Some(order_id));
    assert_eq!(body["order"]["product_name"], "Stacked Account");

    let path = format!("/api/admin/orders/{order_id}/complete");
    let (status, body) = read(post_json(&admin, &path, &json!({})).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status_label"], "Redeemed");

    let (status, body) = read(post_json(&admin, &path, &json!({})).await).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Order is not pending");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_admin_reply_reaches_customer() {
    let admin = owner().await;
    let (customer, _) = customer().await;

    let (_, body) = read(
        post_json(&customer, "/api/dashboard/chat/messages", &json!({ "body": "hello?" })).await,
    )
    .await;
    let conversation_id = body["conversation"]["id"].as_i64().unwrap();

    let path = format!("/api/admin/conversations/{conversation_id}/messages");
    let (status, body) = read(post_json(&admin, &path, &json!({ "body": " on it " })).await).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["conversations"].as_array().is_some());
    assert_eq!(body["conversation"]["admin_presence"]["online"], true);

    let (_, body) = read(get(&customer, "/api/dashboard/chat").await).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["body"], "on it");
    assert_eq!(messages[1]["is_admin"], true);
}
