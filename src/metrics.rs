//! Prometheus metrics for Shadow Signals
//!
//! Exposes metrics endpoint for monitoring:
//! - Signal generation counter
//! - Notification delivery counters per channel
//! - Cache hit/miss counters
//! - Upstream fallback counter
//! - Checkout session counter

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics state
pub struct MetricsState {
    /// Prometheus registry
    registry: Registry,
    /// Signals generated total
    pub signals_generated: IntCounter,
    /// Notifications delivered, labeled by channel
    pub notifications_sent: IntCounterVec,
    /// Notification delivery failures, labeled by channel
    pub notifications_failed: IntCounterVec,
    /// Cache hits, labeled by cache name
    pub cache_hits: IntCounterVec,
    /// Cache misses, labeled by cache name
    pub cache_misses: IntCounterVec,
    /// Responses served from fallback data, labeled by provider
    pub upstream_fallbacks: IntCounterVec,
    /// Checkout sessions created
    pub checkout_sessions: IntCounter,
    /// Webhook events processed, labeled by event type
    pub webhook_events: IntCounterVec,
}

impl MetricsState {
    /// Create a new metrics state with all metrics registered
    pub fn new() -> Self {
        let registry = Registry::new();

        let signals_generated = IntCounter::with_opts(Opts::new(
            "shadow_signals_generated_total",
            "Total number of on-chain signals generated",
        ))
        .expect("Failed to create signals_generated counter");
        registry
            .register(Box::new(signals_generated.clone()))
            .expect("Failed to register signals_generated");

        let notifications_sent = IntCounterVec::new(
            Opts::new(
                "shadow_notifications_sent_total",
                "Notifications delivered, by channel",
            ),
            &["channel"],
        )
        .expect("Failed to create notifications_sent counter");
        registry
            .register(Box::new(notifications_sent.clone()))
            .expect("Failed to register notifications_sent");

        let notifications_failed = IntCounterVec::new(
            Opts::new(
                "shadow_notifications_failed_total",
                "Notification delivery failures, by channel",
            ),
            &["channel"],
        )
        .expect("Failed to create notifications_failed counter");
        registry
            .register(Box::new(notifications_failed.clone()))
            .expect("Failed to register notifications_failed");

        let cache_hits = IntCounterVec::new(
            Opts::new("shadow_cache_hits_total", "Cache hits, by cache"),
            &["cache"],
        )
        .expect("Failed to create cache_hits counter");
        registry
            .register(Box::new(cache_hits.clone()))
            .expect("Failed to register cache_hits");

        let cache_misses = IntCounterVec::new(
            Opts::new("shadow_cache_misses_total", "Cache misses, by cache"),
            &["cache"],
        )
        .expect("Failed to create cache_misses counter");
        registry
            .register(Box::new(cache_misses.clone()))
            .expect("Failed to register cache_misses");

        let upstream_fallbacks = IntCounterVec::new(
            Opts::new(
                "shadow_upstream_fallbacks_total",
                "Responses served from fallback data, by provider",
            ),
            &["provider"],
        )
        .expect("Failed to create upstream_fallbacks counter");
        registry
            .register(Box::new(upstream_fallbacks.clone()))
            .expect("Failed to register upstream_fallbacks");

        let checkout_sessions = IntCounter::with_opts(Opts::new(
            "shadow_checkout_sessions_total",
            "Checkout sessions created",
        ))
        .expect("Failed to create checkout_sessions counter");
        registry
            .register(Box::new(checkout_sessions.clone()))
            .expect("Failed to register checkout_sessions");

        let webhook_events = IntCounterVec::new(
            Opts::new(
                "shadow_webhook_events_total",
                "Stripe webhook events processed, by type",
            ),
            &["event_type"],
        )
        .expect("Failed to create webhook_events counter");
        registry
            .register(Box::new(webhook_events.clone()))
            .expect("Failed to register webhook_events");

        Self {
            registry,
            signals_generated,
            notifications_sent,
            notifications_failed,
            cache_hits,
            cache_misses,
            upstream_fallbacks,
            checkout_sessions,
            webhook_events,
        }
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for MetricsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics handler - returns Prometheus metrics in text format
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.registry().gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        buffer,
    )
}

/// Create metrics router
pub fn metrics_router() -> Router<Arc<MetricsState>> {
    Router::new().route("/metrics", get(metrics_handler))
}
