//! Shadow Signals - Subscription-gated crypto market intelligence service
//!
//! This is the main entry point for the API service.
//! It sets up the Axum web server with middleware and routes.

mod access;
mod analytics;
mod cache;
mod checkout;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod notifications;
mod providers;
mod signals;
mod tiers;

use axum::{routing::get, Router};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::access::AccessEvaluator;
use crate::analytics::SearchAnalytics;
use crate::cache::TtlCache;
use crate::checkout::{CheckoutOrchestrator, StripeClient, SubscriptionLedger};
use crate::config::AppConfig;
use crate::handlers::{health_simple, AppState};
use crate::metrics::MetricsState;
use crate::notifications::{
    DeliveryChannel, EmailChannel, NotificationEngine, NotificationStore, PreferenceStore,
    WebhookChannel,
};
use crate::providers::{AiAnalyzer, EtherscanProvider, MarketClient, RequestBudget};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    tracing::info!("Starting Shadow Signals v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    // Shared explorer API budget
    let budget = Arc::new(RequestBudget::new(
        config.onchain.max_calls_per_second as usize,
        config.onchain.max_calls_per_day,
    ));

    // Upstream providers
    let onchain = Arc::new(EtherscanProvider::new(
        config.onchain.clone(),
        budget.clone(),
    )?);
    let market = Arc::new(MarketClient::new(config.market.clone())?);
    let ai = Arc::new(AiAnalyzer::new(config.ai.clone())?);
    tracing::info!("Upstream providers initialized");

    // Metrics registry
    let metrics = Arc::new(MetricsState::new());

    // Notification pipeline
    let preferences = Arc::new(PreferenceStore::new());
    let notifications = Arc::new(NotificationStore::new(
        config.notifications.max_stored_per_user,
    ));
    let channels: Vec<Arc<dyn DeliveryChannel>> = vec![
        Arc::new(EmailChannel::new()),
        Arc::new(WebhookChannel::new(config.notifications.channel_timeout_ms)),
    ];
    let engine = Arc::new(
        NotificationEngine::new(preferences.clone(), notifications.clone(), channels)
            .with_metrics(metrics.clone()),
    );
    tracing::info!("Notification engine initialized");

    // Checkout is optional; read endpoints work without Stripe configured
    let ledger = Arc::new(SubscriptionLedger::new());
    let checkout = if config.stripe.secret_key.is_empty() {
        tracing::warn!("Stripe secret key not set - checkout endpoints disabled");
        None
    } else {
        let provider = Arc::new(StripeClient::new(&config.stripe)?);
        Some(Arc::new(CheckoutOrchestrator::new(
            provider,
            config.stripe.clone(),
            ledger.clone(),
        )))
    };

    // Access evaluation (dev override is refused in production by validate)
    let access = AccessEvaluator::new(&config.access);

    // Shared state
    let app_state = Arc::new(AppState {
        onchain,
        market,
        ai,
        access,
        feed_cache: TtlCache::new(config.cache.transactions_ttl_secs),
        metrics_cache: TtlCache::new(config.cache.metrics_ttl_secs),
        preferences,
        notifications,
        engine,
        checkout,
        ledger,
        budget,
        analytics: Arc::new(SearchAnalytics::new(config.analytics.max_entries)),
        metrics: metrics.clone(),
        started_at: Utc::now(),
        config,
    });

    // Create rate limiter configuration
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(app_state.config.security.api_rate_limit as u64)
            .burst_size(app_state.config.security.api_burst_size)
            .finish()
            .expect("Failed to create rate limiter config"),
    );

    tracing::info!(
        rate_limit = app_state.config.security.api_rate_limit,
        burst_size = app_state.config.security.api_burst_size,
        "Rate limiting configured"
    );

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    // API routes under /api/v1, rate limited
    let api_routes = handlers::api_router(app_state.clone()).layer(rate_limit_layer);

    // Simple health check for load balancers
    let root_routes = Router::new().route("/health", get(health_simple));

    // Build final router
    let app = Router::new()
        .nest("/api/v1", api_routes)
        .merge(root_routes)
        .merge(metrics::metrics_router().with_state(metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!(
        "{}:{}",
        app_state.config.server.host, app_state.config.server.port
    )
    .parse()
    .expect("Invalid server address");

    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shadow_signals=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Load and validate configuration
fn load_config() -> anyhow::Result<AppConfig> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}
