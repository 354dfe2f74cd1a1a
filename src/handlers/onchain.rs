//! On-chain data endpoints
//!
//! Whale transaction listings and their derived signals, aggregate metrics,
//! and signal batch analysis. Listings and metrics are cached; provider
//! failures degrade to a static dataset tagged `source: "fallback"` rather
//! than surfacing an error.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::error::AppError;
use crate::models::{OnChainSignal, WhaleTransaction};
use crate::providers::{etherscan, FeedSource, SignalSummary, UsageStats};
use crate::signals::{self, OnChainMetrics};

/// Query parameters for the whale transaction listing
#[derive(Debug, Deserialize)]
pub struct WhaleTransactionsQuery {
    #[serde(rename = "minValue")]
    pub min_value: Option<f64>,
}

/// A cached transaction listing with its derived signals
#[derive(Debug, Clone, Serialize)]
pub struct CachedFeed {
    pub transactions: Vec<WhaleTransaction>,
    pub signals: Vec<OnChainSignal>,
    pub timestamp: i64,
    pub source: FeedSource,
}

/// List whale transactions above a USD threshold, with derived signals
///
/// GET /api/v1/on-chain/whale-transactions?minValue=100000
pub async fn whale_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WhaleTransactionsQuery>,
) -> Result<Json<CachedFeed>, AppError> {
    let min_value = params
        .min_value
        .unwrap_or(state.config.onchain.default_min_value_usd);
    if min_value < 0.0 || !min_value.is_finite() {
        return Err(AppError::Validation(
            "minValue must be a non-negative number".to_string(),
        ));
    }

    // Key on the threshold's exact bit pattern so fractional filters
    // never alias (finite and non-negative here, so bits are unique)
    let cache_key = min_value.to_bits();
    if let Some(cached) = state.feed_cache.get(&cache_key) {
        state
            .metrics
            .cache_hits
            .with_label_values(&["transactions"])
            .inc();
        tracing::debug!(min_value, "Returning cached whale transactions");
        return Ok(Json(cached));
    }
    state
        .metrics
        .cache_misses
        .with_label_values(&["transactions"])
        .inc();

    let (transactions, source) = match state.onchain.recent_transactions(min_value).await {
        Ok(txs) => (txs, FeedSource::Live),
        Err(e) => {
            tracing::warn!(error = %e, "Whale transaction fetch failed, serving fallback data");
            state
                .metrics
                .upstream_fallbacks
                .with_label_values(&["onchain"])
                .inc();
            let txs = etherscan::fallback_transactions()
                .into_iter()
                .filter(|tx| tx.value_usd >= min_value)
                .collect();
            (txs, FeedSource::Fallback)
        }
    };

    let generated = signals::generate_signals(&transactions);
    state.metrics.signals_generated.inc_by(generated.len() as u64);

    let feed = CachedFeed {
        transactions,
        signals: generated,
        timestamp: Utc::now().timestamp_millis(),
        source,
    };
    state.feed_cache.set(cache_key, feed.clone());

    tracing::info!(
        count = feed.transactions.len(),
        signals = feed.signals.len(),
        ?source,
        "Whale transactions served"
    );
    Ok(Json(feed))
}

/// Aggregate on-chain metrics over the recent transaction window
///
/// GET /api/v1/on-chain/metrics
pub async fn onchain_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OnChainMetrics>, AppError> {
    if let Some(cached) = state.metrics_cache.get(&()) {
        state
            .metrics
            .cache_hits
            .with_label_values(&["metrics"])
            .inc();
        return Ok(Json(cached));
    }
    state
        .metrics
        .cache_misses
        .with_label_values(&["metrics"])
        .inc();

    let min_value = state.config.onchain.default_min_value_usd;
    let transactions = match state.onchain.recent_transactions(min_value).await {
        Ok(txs) => txs,
        Err(e) => {
            tracing::warn!(error = %e, "Metrics fetch failed, computing from fallback data");
            state
                .metrics
                .upstream_fallbacks
                .with_label_values(&["onchain"])
                .inc();
            etherscan::fallback_transactions()
        }
    };

    let metrics = signals::compute_metrics(&transactions);
    state.metrics_cache.set((), metrics.clone());
    Ok(Json(metrics))
}

/// Request body for signal batch analysis
#[derive(Debug, Deserialize)]
pub struct SignalsAnalysisRequest {
    pub signals: Vec<OnChainSignal>,
}

/// Analyze a signal batch for overall sentiment
///
/// POST /api/v1/on-chain/signals-analysis
pub async fn signals_analysis(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignalsAnalysisRequest>,
) -> Result<Json<SignalSummary>, AppError> {
    tracing::info!(count = body.signals.len(), "Analyzing signal batch");
    let summary = state.ai.summarize_signals(&body.signals);
    Ok(Json(summary))
}

/// Current explorer API budget usage
///
/// GET /api/v1/on-chain/usage-stats
pub async fn usage_stats(State(state): State<Arc<AppState>>) -> Json<UsageStats> {
    Json(state.budget.usage())
}
