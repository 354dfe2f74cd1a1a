//! API Integration Tests
//!
//! Tests REST API endpoints for:
//! - Health check
//! - Tier catalog and access checks
//! - Search analytics
//! - Usage stats

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{get_json, post_json, test_app, TestOptions};

// =============================================================================
// HEALTH CHECK TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].is_number());
    assert_eq!(body["checkout_enabled"], true);
    assert_eq!(body["dev_override"], false);
}

#[tokio::test]
async fn test_health_reports_checkout_disabled() {
    let app = test_app(TestOptions {
        with_checkout: false,
        ..Default::default()
    });
    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checkout_enabled"], false);
}

// =============================================================================
// TIER CATALOG TESTS
// =============================================================================

#[tokio::test]
async fn test_tiers_catalog_order_and_prices() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/tiers").await;

    assert_eq!(status, StatusCode::OK);
    let tiers = body["tiers"].as_array().unwrap();
    assert_eq!(tiers.len(), 4);
    assert_eq!(tiers[0]["id"], "free");
    assert_eq!(tiers[0]["formattedPrice"], "Free");
    assert_eq!(tiers[1]["id"], "basic");
    assert_eq!(tiers[1]["formattedPrice"], "£23/mo");
    assert_eq!(tiers[3]["id"], "institutional");
    assert_eq!(tiers[3]["formattedPrice"], "£399/mo");
}

#[tokio::test]
async fn test_tier_limits_exposed() {
    let app = test_app(TestOptions::default());
    let (_, body) = get_json(&app, "/tiers").await;

    let free = &body["tiers"][0];
    assert_eq!(free["limits"]["whale_alerts_per_day"], 5);
    assert_eq!(free["limits"]["api_access"], false);

    let pro = &body["tiers"][2];
    assert!(pro["limits"]["whale_alerts_per_day"].is_null());
    assert_eq!(pro["limits"]["custom_alerts"], true);
}

// =============================================================================
// ACCESS CHECK TESTS
// =============================================================================

#[tokio::test]
async fn test_access_granted_by_rank() {
    let app = test_app(TestOptions::default());

    let (status, body) = get_json(&app, "/tiers/access?current=pro&required=basic").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasAccess"], true);
    assert_eq!(body["effectiveTier"], "pro");

    let (_, body) = get_json(&app, "/tiers/access?current=basic&required=pro").await;
    assert_eq!(body["hasAccess"], false);
}

#[tokio::test]
async fn test_access_unknown_tier_rejected() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/tiers/access?current=platinum&required=pro").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["reason"], "validation_failed");
}

// =============================================================================
// SEARCH ANALYTICS TESTS
// =============================================================================

#[tokio::test]
async fn test_search_logging_and_report() {
    let app = test_app(TestOptions::default());

    for query in ["Bitcoin", "bitcoin", "  BITCOIN  ", "ethereum"] {
        let (status, body) = post_json(&app, "/search-analytics", json!({"query": query})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (status, body) = get_json(&app, "/search-analytics?period=all").await;
    assert_eq!(status, StatusCode::OK);

    // Queries are normalized before counting
    let top = body["topQueries"].as_array().unwrap();
    assert_eq!(top[0]["query"], "bitcoin");
    assert_eq!(top[0]["count"], 3);
    assert_eq!(body["totalSearches"], 4);
}

#[tokio::test]
async fn test_search_empty_query_rejected() {
    let app = test_app(TestOptions::default());
    let (status, _) = post_json(&app, "/search-analytics", json!({"query": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_report_invalid_period() {
    let app = test_app(TestOptions::default());
    let (status, _) = get_json(&app, "/search-analytics?period=decade").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// USAGE STATS TESTS
// =============================================================================

#[tokio::test]
async fn test_usage_stats_shape() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/on-chain/usage-stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dailyCallCount"], 0);
    assert_eq!(body["maxDailyCalls"], 100_000);
    assert_eq!(body["remainingCalls"], 100_000);
}
