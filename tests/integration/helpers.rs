//! Shared test fixtures
//!
//! Provider doubles and app construction used across the integration
//! tests. Routers are cheap to clone and share their state, so tests can
//! issue several requests against one fixture.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use shadow_signals::access::AccessEvaluator;
use shadow_signals::analytics::SearchAnalytics;
use shadow_signals::cache::TtlCache;
use shadow_signals::checkout::{
    CheckoutOrchestrator, PaymentProvider, ProviderSubscription, SubscriptionLedger,
};
use shadow_signals::config::AppConfig;
use shadow_signals::error::{AppError, AppResult};
use shadow_signals::handlers::{self, AppState};
use shadow_signals::metrics::MetricsState;
use shadow_signals::models::{Direction, OnChainSignal, Severity, WhaleTransaction};
use shadow_signals::notifications::{NotificationEngine, NotificationStore, PreferenceStore};
use shadow_signals::providers::ai::Recommendation;
use shadow_signals::providers::{
    AiAnalysis, AiProvider, MarketDataProvider, MarketQuote, OnChainProvider, RequestBudget,
    RiskLevel, Sentiment, SignalSummary,
};
use shadow_signals::tiers::TierId;

/// On-chain provider double serving a fixed transaction set
pub struct StaticOnChain {
    pub fail: bool,
    pub transactions: Vec<WhaleTransaction>,
}

#[async_trait::async_trait]
impl OnChainProvider for StaticOnChain {
    async fn eth_price(&self) -> AppResult<f64> {
        if self.fail {
            return Err(AppError::Upstream("explorer down".to_string()));
        }
        Ok(3500.0)
    }

    async fn recent_transactions(&self, min_value_usd: f64) -> AppResult<Vec<WhaleTransaction>> {
        if self.fail {
            return Err(AppError::Upstream("explorer down".to_string()));
        }
        Ok(self
            .transactions
            .iter()
            .filter(|tx| tx.value_usd >= min_value_usd)
            .cloned()
            .collect())
    }
}

/// Market data double
pub struct StaticMarket {
    pub fail: bool,
}

fn quote(symbol: &str) -> MarketQuote {
    MarketQuote {
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        price: "1.0000".to_string(),
        change: "+0.10%".to_string(),
        sentiment: "neutral".to_string(),
        icon: "X".to_string(),
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for StaticMarket {
    async fn forex(&self) -> AppResult<Vec<MarketQuote>> {
        if self.fail {
            return Err(AppError::Upstream("rates down".to_string()));
        }
        Ok(vec![quote("EUR/USD"), quote("GBP/USD")])
    }

    async fn commodities(&self) -> AppResult<Vec<MarketQuote>> {
        if self.fail {
            return Err(AppError::Upstream("rates down".to_string()));
        }
        Ok(vec![quote("GOLD")])
    }
}

/// Rule-only analysis double
pub struct RuleAi;

#[async_trait::async_trait]
impl AiProvider for RuleAi {
    async fn analyze_transactions(
        &self,
        _transactions: &[WhaleTransaction],
        token_symbol: &str,
    ) -> AppResult<AiAnalysis> {
        Ok(AiAnalysis {
            sentiment: Sentiment::Neutral,
            confidence: 65,
            reasoning: format!("Mixed flow for {}", token_symbol),
            recommendation: Recommendation::Hold,
            key_insights: vec![],
            risk_level: RiskLevel::Medium,
        })
    }

    fn summarize_signals(&self, signals: &[OnChainSignal]) -> SignalSummary {
        let critical = signals
            .iter()
            .filter(|s| s.severity >= Severity::High)
            .cloned()
            .collect::<Vec<_>>();
        SignalSummary {
            overall_sentiment: Sentiment::Neutral,
            critical_signals: critical,
            summary: format!("{} signals analyzed", signals.len()),
        }
    }
}

/// Payment provider double; knows one customer with an active Pro plan
pub struct FakePayment;

#[async_trait::async_trait]
impl PaymentProvider for FakePayment {
    async fn create_checkout_session(&self, price_id: &str, _tier_id: TierId) -> AppResult<String> {
        Ok(format!("cs_test_{}", price_id))
    }

    async fn active_subscription(
        &self,
        customer_id: &str,
    ) -> AppResult<Option<ProviderSubscription>> {
        if customer_id == "cus_pro" {
            return Ok(Some(ProviderSubscription {
                tier: TierId::Pro,
                status: "active".to_string(),
                current_period_end: None,
            }));
        }
        Ok(None)
    }
}

pub fn tx(hash: &str, from: &str, direction: Direction, value_usd: f64) -> WhaleTransaction {
    WhaleTransaction {
        hash: hash.to_string(),
        from: from.to_string(),
        to: "0xrecipient".to_string(),
        value: format!("{:.4}", value_usd / 3500.0),
        value_usd,
        timestamp: Utc::now().timestamp_millis(),
        block_number: 19_000_000,
        direction,
        token: None,
        gas_used: String::new(),
        gas_price: String::new(),
    }
}

/// A window with one critical buy, one high sell, an accumulation pattern,
/// and one transaction below the signal threshold
pub fn sample_transactions() -> Vec<WhaleTransaction> {
    vec![
        tx("0xaaa1", "0xwhale1", Direction::Buy, 1_200_000.0),
        tx("0xaaa2", "0xwhale2", Direction::Sell, 600_000.0),
        tx("0xaaa3", "0xfund", Direction::Buy, 200_000.0),
        tx("0xaaa4", "0xfund", Direction::Buy, 250_000.0),
        tx("0xaaa5", "0xfund", Direction::Buy, 300_000.0),
        tx("0xaaa6", "0xwhale3", Direction::Transfer, 150_000.0),
    ]
}

pub struct TestOptions {
    pub onchain_fail: bool,
    pub market_fail: bool,
    pub with_checkout: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            onchain_fail: false,
            market_fail: false,
            with_checkout: true,
        }
    }
}

pub fn test_app(opts: TestOptions) -> Router {
    let mut config = AppConfig::default();
    if opts.with_checkout {
        config.stripe.secret_key = "sk_test".to_string();
        config.stripe.webhook_secret = "whsec_test".to_string();
        config.stripe.price_id_basic = Some("price_basic".to_string());
        config.stripe.price_id_pro = Some("price_pro".to_string());
        config.stripe.price_id_institutional = Some("price_inst".to_string());
    }

    let preferences = Arc::new(PreferenceStore::new());
    let notifications = Arc::new(NotificationStore::new(
        config.notifications.max_stored_per_user,
    ));
    let engine = Arc::new(NotificationEngine::new(
        preferences.clone(),
        notifications.clone(),
        vec![],
    ));

    let ledger = Arc::new(SubscriptionLedger::new());
    let checkout = if opts.with_checkout {
        Some(Arc::new(CheckoutOrchestrator::new(
            Arc::new(FakePayment),
            config.stripe.clone(),
            ledger.clone(),
        )))
    } else {
        None
    };

    let state = Arc::new(AppState {
        onchain: Arc::new(StaticOnChain {
            fail: opts.onchain_fail,
            transactions: sample_transactions(),
        }),
        market: Arc::new(StaticMarket {
            fail: opts.market_fail,
        }),
        ai: Arc::new(RuleAi),
        access: AccessEvaluator::production(),
        feed_cache: TtlCache::new(config.cache.transactions_ttl_secs),
        metrics_cache: TtlCache::new(config.cache.metrics_ttl_secs),
        preferences,
        notifications,
        engine,
        checkout,
        ledger,
        budget: Arc::new(RequestBudget::new(5, 100_000)),
        analytics: Arc::new(SearchAnalytics::new(config.analytics.max_entries)),
        metrics: Arc::new(MetricsState::new()),
        started_at: Utc::now(),
        config,
    });

    handlers::api_router(state)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_response(response).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_response(response).await
}

async fn read_response(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
