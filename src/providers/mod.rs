//! External data providers
//!
//! On-chain, market-data, and AI capabilities behind traits so handlers can
//! be tested against doubles. All outbound calls carry a bounded timeout;
//! read paths fall back to static datasets when a provider fails.

pub mod ai;
pub mod etherscan;
pub mod market;
pub mod rate_limiter;

pub use ai::{AiAnalysis, AiAnalyzer, RiskLevel, Sentiment, SignalSummary};
pub use etherscan::EtherscanProvider;
pub use market::MarketClient;
pub use rate_limiter::{RequestBudget, UsageStats};

use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{OnChainSignal, WhaleTransaction};

/// Where a response's data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    Live,
    Fallback,
}

/// A single quote in a market snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub sentiment: String,
    pub icon: String,
}

/// A set of market quotes with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub data: Vec<MarketQuote>,
    pub source: FeedSource,
    pub timestamp: i64,
}

/// On-chain transaction feed
#[async_trait::async_trait]
pub trait OnChainProvider: Send + Sync {
    /// Current ETH price in USD
    async fn eth_price(&self) -> AppResult<f64>;

    /// Recent whale transactions at or above the USD threshold,
    /// newest first
    async fn recent_transactions(&self, min_value_usd: f64) -> AppResult<Vec<WhaleTransaction>>;
}

/// Forex and commodity quotes
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn forex(&self) -> AppResult<Vec<MarketQuote>>;
    async fn commodities(&self) -> AppResult<Vec<MarketQuote>>;
}

/// Transaction pattern analysis
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    async fn analyze_transactions(
        &self,
        transactions: &[WhaleTransaction],
        token_symbol: &str,
    ) -> AppResult<AiAnalysis>;

    /// Aggregate sentiment over a signal batch; never fails, the rollup is
    /// pure arithmetic
    fn summarize_signals(&self, signals: &[OnChainSignal]) -> SignalSummary;
}
