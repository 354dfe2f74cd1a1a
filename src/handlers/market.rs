//! Forex and commodities endpoints
//!
//! Both degrade to static fallback tables when the upstream provider is
//! unavailable, tagged with a source marker.

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use super::AppState;
use crate::providers::market as market_provider;
use crate::providers::{FeedSource, MarketSnapshot};

/// Current forex quotes
///
/// GET /api/v1/market/forex
pub async fn forex(State(state): State<Arc<AppState>>) -> Json<MarketSnapshot> {
    let (data, source) = match state.market.forex().await {
        Ok(quotes) => (quotes, FeedSource::Live),
        Err(e) => {
            tracing::warn!(error = %e, "Forex fetch failed, serving fallback data");
            state
                .metrics
                .upstream_fallbacks
                .with_label_values(&["forex"])
                .inc();
            (market_provider::fallback_forex(), FeedSource::Fallback)
        }
    };

    Json(MarketSnapshot {
        data,
        source,
        timestamp: Utc::now().timestamp_millis(),
    })
}

/// Current commodity quotes
///
/// GET /api/v1/market/commodities
pub async fn commodities(State(state): State<Arc<AppState>>) -> Json<MarketSnapshot> {
    let (data, source) = match state.market.commodities().await {
        Ok(quotes) => (quotes, FeedSource::Live),
        Err(e) => {
            tracing::debug!(error = %e, "Commodities fetch unavailable, serving fallback data");
            state
                .metrics
                .upstream_fallbacks
                .with_label_values(&["commodities"])
                .inc();
            (market_provider::fallback_commodities(), FeedSource::Fallback)
        }
    };

    Json(MarketSnapshot {
        data,
        source,
        timestamp: Utc::now().timestamp_millis(),
    })
}
