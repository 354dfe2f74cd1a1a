//! HTTP handlers for Shadow Signals

mod analytics;
mod checkout;
mod health;
mod market;
mod notifications;
mod onchain;
mod tiers;

pub use analytics::*;
pub use checkout::*;
pub use health::*;
pub use market::*;
pub use notifications::*;
pub use onchain::*;
pub use tiers::*;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::access::AccessEvaluator;
use crate::analytics::SearchAnalytics;
use crate::cache::TtlCache;
use crate::checkout::{CheckoutOrchestrator, SubscriptionLedger};
use crate::config::AppConfig;
use crate::metrics::MetricsState;
use crate::notifications::{NotificationEngine, NotificationStore, PreferenceStore};
use crate::providers::{AiProvider, MarketDataProvider, OnChainProvider, RequestBudget};
use crate::signals::OnChainMetrics;

/// Shared state for API handlers
pub struct AppState {
    pub config: AppConfig,
    pub onchain: Arc<dyn OnChainProvider>,
    pub market: Arc<dyn MarketDataProvider>,
    pub ai: Arc<dyn AiProvider>,
    pub access: AccessEvaluator,
    /// Whale transaction listings keyed by the normalized minValue filter
    pub feed_cache: TtlCache<u64, CachedFeed>,
    /// On-chain metrics aggregate (single key, kept keyed for uniformity)
    pub metrics_cache: TtlCache<(), OnChainMetrics>,
    pub preferences: Arc<PreferenceStore>,
    pub notifications: Arc<NotificationStore>,
    pub engine: Arc<NotificationEngine>,
    pub checkout: Option<Arc<CheckoutOrchestrator>>,
    pub ledger: Arc<SubscriptionLedger>,
    pub budget: Arc<RequestBudget>,
    pub analytics: Arc<SearchAnalytics>,
    pub metrics: Arc<MetricsState>,
    pub started_at: DateTime<Utc>,
}

/// All API routes, nested under /api/v1 by the binary
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/on-chain/whale-transactions", get(whale_transactions))
        .route("/on-chain/metrics", get(onchain_metrics))
        .route("/on-chain/signals-analysis", post(signals_analysis))
        .route("/on-chain/usage-stats", get(usage_stats))
        .route("/notifications/process", post(process_signals))
        .route(
            "/notifications/preferences",
            get(get_preferences).post(update_preferences),
        )
        .route("/notifications/list", get(list_notifications))
        .route("/notifications/mark-read", post(mark_read))
        .route("/tiers", get(list_tiers))
        .route("/tiers/access", get(check_access))
        .route("/checkout", post(create_checkout))
        .route("/subscription/status", get(subscription_status))
        .route("/webhooks/stripe", post(stripe_webhook))
        .route("/market/forex", get(forex))
        .route("/market/commodities", get(commodities))
        .route(
            "/search-analytics",
            get(search_report).post(log_search),
        )
        .route("/health", get(health_check))
        .with_state(state)
}
