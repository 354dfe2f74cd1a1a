//! Checkout and Webhook Integration Tests
//!
//! Tests checkout session creation, subscription status lookup, and the
//! signed Stripe webhook endpoint through the HTTP surface.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;

use crate::helpers::{get_json, post_json, test_app, TestOptions};

// =============================================================================
// CHECKOUT SESSION TESTS
// =============================================================================

#[tokio::test]
async fn test_checkout_creates_session() {
    let app = test_app(TestOptions::default());
    let (status, body) = post_json(&app, "/checkout", json!({"tierId": "pro"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clientSecret"], "cs_test_price_pro");
}

#[tokio::test]
async fn test_checkout_unknown_tier() {
    let app = test_app(TestOptions::default());
    let (status, body) = post_json(&app, "/checkout", json!({"tierId": "platinum"})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["reason"], "not_found");
}

#[tokio::test]
async fn test_checkout_free_tier_rejected() {
    let app = test_app(TestOptions::default());
    let (status, _) = post_json(&app, "/checkout", json!({"tierId": "free"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_disabled_without_stripe() {
    let app = test_app(TestOptions {
        with_checkout: false,
        ..Default::default()
    });
    let (status, _) = post_json(&app, "/checkout", json!({"tierId": "pro"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// SUBSCRIPTION STATUS TESTS
// =============================================================================

#[tokio::test]
async fn test_subscription_status_active_customer() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/subscription/status?customerId=cus_pro").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "pro");
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn test_subscription_status_unknown_customer() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/subscription/status?customerId=cus_none").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "free");
    assert_eq!(body["status"], "inactive");
}

// =============================================================================
// WEBHOOK TESTS
// =============================================================================

fn sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

async fn post_webhook(app: &Router, signature: Option<&str>, body: &[u8]) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/stripe")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("stripe-signature", sig);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_vec())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_webhook_valid_signature_accepted() {
    let app = test_app(TestOptions::default());
    let body = json!({
        "type": "customer.subscription.created",
        "data": {"object": {
            "id": "sub_1",
            "customer": "cus_123",
            "status": "active",
            "items": {"data": [{"price": {"id": "price_pro"}}]},
        }},
    })
    .to_string();

    let header = sign("whsec_test", Utc::now().timestamp(), body.as_bytes());
    let (status, response) = post_webhook(&app, Some(&header), body.as_bytes()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["received"], true);
}

#[tokio::test]
async fn test_webhook_missing_signature_rejected() {
    let app = test_app(TestOptions::default());
    let body = br#"{"type": "checkout.session.completed", "data": {"object": {}}}"#;

    let (status, response) = post_webhook(&app, None, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["reason"], "invalid_signature");
}

#[tokio::test]
async fn test_webhook_wrong_secret_rejected() {
    let app = test_app(TestOptions::default());
    let body = br#"{"type": "checkout.session.completed", "data": {"object": {}}}"#;

    let header = sign("whsec_wrong", Utc::now().timestamp(), body);
    let (status, _) = post_webhook(&app, Some(&header), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_stale_timestamp_rejected() {
    let app = test_app(TestOptions::default());
    let body = br#"{"type": "checkout.session.completed", "data": {"object": {}}}"#;

    let header = sign("whsec_test", Utc::now().timestamp() - 10_000, body);
    let (status, _) = post_webhook(&app, Some(&header), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
