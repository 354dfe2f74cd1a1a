//! Notification Flow Integration Tests
//!
//! Exercises the full pipeline through HTTP: preference updates, signal
//! batch processing, the bounded notification list, and read-state
//! transitions.

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::helpers::{get_json, post_json, test_app, TestOptions};

async fn feed_signals(app: &axum::Router) -> Value {
    let (_, feed) = get_json(app, "/on-chain/whale-transactions?minValue=100000").await;
    feed["signals"].clone()
}

// =============================================================================
// PREFERENCE TESTS
// =============================================================================

#[tokio::test]
async fn test_preferences_default_on_first_access() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/notifications/preferences?userId=alice").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "alice");
    assert_eq!(body["inAppEnabled"], true);
    assert_eq!(body["minSeverity"], "low");
    assert_eq!(body["tokens"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_preferences_partial_update_merges() {
    let app = test_app(TestOptions::default());

    let (status, body) = post_json(
        &app,
        "/notifications/preferences",
        json!({"userId": "alice", "minSeverity": "high"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferences"]["minSeverity"], "high");

    // A second partial update must not reset the first
    let (_, body) = post_json(
        &app,
        "/notifications/preferences",
        json!({"userId": "alice", "emailEnabled": false}),
    )
    .await;
    assert_eq!(body["preferences"]["minSeverity"], "high");
    assert_eq!(body["preferences"]["emailEnabled"], false);
    assert_eq!(body["preferences"]["inAppEnabled"], true);
}

#[tokio::test]
async fn test_preferences_default_user_fallback() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/notifications/preferences").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "demo_user");
}

// =============================================================================
// SIGNAL PROCESSING TESTS
// =============================================================================

#[tokio::test]
async fn test_process_signals_creates_notifications() {
    let app = test_app(TestOptions::default());
    let signals = feed_signals(&app).await;
    let count = signals.as_array().unwrap().len();
    assert!(count >= 3);

    let (status, body) = post_json(
        &app,
        "/notifications/process",
        json!({"signals": signals, "userId": "alice"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    // Default preferences accept every severity
    assert_eq!(body["notificationsSent"], count);
    assert_eq!(body["notificationIds"].as_array().unwrap().len(), count);
}

#[tokio::test]
async fn test_process_respects_min_severity() {
    let app = test_app(TestOptions::default());
    let signals = feed_signals(&app).await;

    post_json(
        &app,
        "/notifications/preferences",
        json!({"userId": "bob", "minSeverity": "critical"}),
    )
    .await;

    let (_, body) = post_json(
        &app,
        "/notifications/process",
        json!({"signals": signals, "userId": "bob"}),
    )
    .await;

    // Only the $1.2M buy is critical in the fixture window
    assert_eq!(body["notificationsSent"], 1);
}

#[tokio::test]
async fn test_process_respects_token_filter() {
    let app = test_app(TestOptions::default());
    let signals = feed_signals(&app).await;

    post_json(
        &app,
        "/notifications/preferences",
        json!({"userId": "carol", "tokens": ["PEPE"]}),
    )
    .await;

    let (_, body) = post_json(
        &app,
        "/notifications/process",
        json!({"signals": signals, "userId": "carol"}),
    )
    .await;

    // Fixture signals are all native ETH, none match the allow-list
    assert_eq!(body["notificationsSent"], 0);
}

// =============================================================================
// NOTIFICATION LIST AND READ-STATE TESTS
// =============================================================================

#[tokio::test]
async fn test_list_and_mark_read_flow() {
    let app = test_app(TestOptions::default());
    let signals = feed_signals(&app).await;

    post_json(
        &app,
        "/notifications/process",
        json!({"signals": signals, "userId": "alice"}),
    )
    .await;

    let (status, body) = get_json(&app, "/notifications/list?userId=alice").await;
    assert_eq!(status, StatusCode::OK);
    let total = body["total"].as_u64().unwrap();
    assert!(total >= 3);
    assert_eq!(body["unreadCount"], total);

    let first_id = body["notifications"][0]["id"].as_str().unwrap().to_string();
    let (status, _) = post_json(
        &app,
        "/notifications/mark-read",
        json!({"userId": "alice", "notificationId": first_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&app, "/notifications/list?userId=alice").await;
    assert_eq!(body["unreadCount"], total - 1);

    let (status, _) = post_json(
        &app,
        "/notifications/mark-read",
        json!({"userId": "alice", "markAll": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&app, "/notifications/list?userId=alice").await;
    assert_eq!(body["unreadCount"], 0);
}

#[tokio::test]
async fn test_list_limit_still_reports_full_total() {
    let app = test_app(TestOptions::default());
    let signals = feed_signals(&app).await;
    let count = signals.as_array().unwrap().len() as u64;

    post_json(
        &app,
        "/notifications/process",
        json!({"signals": signals, "userId": "alice"}),
    )
    .await;

    let (_, body) = get_json(&app, "/notifications/list?userId=alice&limit=1").await;
    assert_eq!(body["notifications"].as_array().unwrap().len(), 1);
    assert_eq!(body["total"], count);
    assert_eq!(body["unreadCount"], count);
}

#[tokio::test]
async fn test_mark_read_unknown_id() {
    let app = test_app(TestOptions::default());
    let (status, _) = post_json(
        &app,
        "/notifications/mark-read",
        json!({"userId": "alice", "notificationId": "notif_missing"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_read_requires_id_or_flag() {
    let app = test_app(TestOptions::default());
    let (status, _) = post_json(
        &app,
        "/notifications/mark-read",
        json!({"userId": "alice"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_isolated_per_user() {
    let app = test_app(TestOptions::default());
    let signals = feed_signals(&app).await;

    post_json(
        &app,
        "/notifications/process",
        json!({"signals": signals, "userId": "alice"}),
    )
    .await;

    let (_, body) = get_json(&app, "/notifications/list?userId=mallory").await;
    assert_eq!(body["total"], 0);
}
