//! On-Chain Feed Integration Tests
//!
//! Tests the whale transaction listing, derived signals, metrics aggregate,
//! fallback behavior, and TTL caching through the HTTP surface.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{get_json, post_json, test_app, TestOptions};

// =============================================================================
// WHALE TRANSACTION LISTING TESTS
// =============================================================================

#[tokio::test]
async fn test_whale_transactions_live_source() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/on-chain/whale-transactions?minValue=100000").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "live");
    assert_eq!(body["transactions"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_whale_transactions_threshold_filter() {
    let app = test_app(TestOptions::default());
    let (_, body) = get_json(&app, "/on-chain/whale-transactions?minValue=500000").await;

    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    for tx in transactions {
        assert!(tx["valueUSD"].as_f64().unwrap() >= 500_000.0);
    }
}

#[tokio::test]
async fn test_whale_transactions_negative_threshold_rejected() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/on-chain/whale-transactions?minValue=-5").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "rejected");
}

#[tokio::test]
async fn test_whale_transactions_fallback_on_provider_failure() {
    let app = test_app(TestOptions {
        onchain_fail: true,
        ..Default::default()
    });
    let (status, body) = get_json(&app, "/on-chain/whale-transactions?minValue=100000").await;

    // Provider failure degrades to the static dataset, never an error
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert!(!body["transactions"].as_array().unwrap().is_empty());
    assert!(!body["signals"].as_array().unwrap().is_empty());
}

// =============================================================================
// SIGNAL DERIVATION TESTS
// =============================================================================

#[tokio::test]
async fn test_signals_derived_from_listing() {
    let app = test_app(TestOptions::default());
    let (_, body) = get_json(&app, "/on-chain/whale-transactions?minValue=100000").await;

    let signals = body["signals"].as_array().unwrap();
    let kinds: Vec<&str> = signals
        .iter()
        .map(|s| s["type"].as_str().unwrap())
        .collect();

    // $1.2M buy -> critical whale_buy, $600K sell -> high whale_sell,
    // three buys from 0xfund -> smart_money_accumulation
    assert!(kinds.contains(&"whale_buy"));
    assert!(kinds.contains(&"whale_sell"));
    assert!(kinds.contains(&"smart_money_accumulation"));

    let critical = signals
        .iter()
        .find(|s| s["type"] == "whale_buy")
        .unwrap();
    assert_eq!(critical["severity"], "critical");
}

#[tokio::test]
async fn test_feed_is_cached_within_ttl() {
    let app = test_app(TestOptions::default());

    let (_, first) = get_json(&app, "/on-chain/whale-transactions?minValue=100000").await;
    let (_, second) = get_json(&app, "/on-chain/whale-transactions?minValue=100000").await;

    // Same timestamp proves the second response came from the cache
    assert_eq!(first["timestamp"], second["timestamp"]);

    // A different threshold is a different cache key
    let (_, other) = get_json(&app, "/on-chain/whale-transactions?minValue=500000").await;
    assert_ne!(
        first["transactions"].as_array().unwrap().len(),
        other["transactions"].as_array().unwrap().len()
    );
}

#[tokio::test]
async fn test_fractional_thresholds_do_not_alias() {
    let app = test_app(TestOptions::default());

    // Same integer part, different filter outcomes: the $150K transfer is
    // included at 150000 but excluded at 150000.5
    let (_, whole) = get_json(&app, "/on-chain/whale-transactions?minValue=150000").await;
    let (_, fractional) = get_json(&app, "/on-chain/whale-transactions?minValue=150000.5").await;

    assert_eq!(whole["transactions"].as_array().unwrap().len(), 6);
    assert_eq!(fractional["transactions"].as_array().unwrap().len(), 5);
}

// =============================================================================
// METRICS AGGREGATE TESTS
// =============================================================================

#[tokio::test]
async fn test_onchain_metrics_aggregate() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/on-chain/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalWhaleTransactions"], 6);
    assert!(body["totalVolumeUSD"].as_f64().unwrap() > 2_000_000.0);
    // 0xfund traded repeatedly inside the window
    assert!(body["smartMoneyActivity"].as_u64().unwrap() >= 1);
    assert!(body["topTokens"].as_array().unwrap().len() >= 1);
}

#[tokio::test]
async fn test_onchain_metrics_fallback() {
    let app = test_app(TestOptions {
        onchain_fail: true,
        ..Default::default()
    });
    let (status, body) = get_json(&app, "/on-chain/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["totalWhaleTransactions"].as_u64().unwrap() > 0);
}

// =============================================================================
// SIGNAL ANALYSIS TESTS
// =============================================================================

#[tokio::test]
async fn test_signals_analysis_roundtrip() {
    let app = test_app(TestOptions::default());

    let (_, feed) = get_json(&app, "/on-chain/whale-transactions?minValue=100000").await;
    let (status, summary) = post_json(
        &app,
        "/on-chain/signals-analysis",
        json!({"signals": feed["signals"]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(summary["overallSentiment"].is_string());
    assert!(summary["criticalSignals"].is_array());
}

// =============================================================================
// MARKET DATA TESTS
// =============================================================================

#[tokio::test]
async fn test_forex_live_and_fallback() {
    let app = test_app(TestOptions::default());
    let (status, body) = get_json(&app, "/market/forex").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "live");

    let failing = test_app(TestOptions {
        market_fail: true,
        ..Default::default()
    });
    let (status, body) = get_json(&failing, "/market/forex").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["data"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_commodities_fallback() {
    let app = test_app(TestOptions {
        market_fail: true,
        ..Default::default()
    });
    let (status, body) = get_json(&app, "/market/commodities").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["data"].as_array().unwrap().len(), 6);
}
