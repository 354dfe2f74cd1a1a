//! Configuration management for Shadow Signals
//!
//! Loads configuration from YAML files and environment variables.
//! Environment variables override YAML values.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// On-chain data provider (Etherscan-style REST API)
    #[serde(default)]
    pub onchain: OnChainConfig,
    /// Market data provider (forex / commodities rates)
    #[serde(default)]
    pub market: MarketConfig,
    /// AI text-generation capability
    #[serde(default)]
    pub ai: AiConfig,
    /// Stripe checkout configuration
    #[serde(default)]
    pub stripe: StripeConfig,
    /// Cache TTLs
    #[serde(default)]
    pub cache: CacheConfig,
    /// Access evaluation settings (developer override)
    #[serde(default)]
    pub access: AccessConfig,
    /// Notification settings
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Search analytics settings
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// Rate limiting for the public API
    #[serde(default)]
    pub security: SecurityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// On-chain data provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OnChainConfig {
    /// API key for the block explorer API
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the explorer API
    #[serde(default = "default_onchain_url")]
    pub base_url: String,
    /// Chain id to query (1 = Ethereum mainnet)
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Outbound request timeout in milliseconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_ms: u64,
    /// Default minimum transaction value in USD when no filter given
    #[serde(default = "default_min_value_usd")]
    pub default_min_value_usd: f64,
    /// ETH price to assume when the price endpoint is unavailable
    #[serde(default = "default_fallback_eth_price")]
    pub fallback_eth_price: f64,
    /// Max explorer API calls per second
    #[serde(default = "default_calls_per_second")]
    pub max_calls_per_second: u32,
    /// Max explorer API calls per day
    #[serde(default = "default_calls_per_day")]
    pub max_calls_per_day: u64,
}

fn default_onchain_url() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}

fn default_chain_id() -> u64 {
    1
}

fn default_provider_timeout() -> u64 {
    8000
}

fn default_min_value_usd() -> f64 {
    100_000.0
}

fn default_fallback_eth_price() -> f64 {
    3500.0
}

fn default_calls_per_second() -> u32 {
    5
}

fn default_calls_per_day() -> u64 {
    100_000
}

impl Default for OnChainConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_onchain_url(),
            chain_id: default_chain_id(),
            timeout_ms: default_provider_timeout(),
            default_min_value_usd: default_min_value_usd(),
            fallback_eth_price: default_fallback_eth_price(),
            max_calls_per_second: default_calls_per_second(),
            max_calls_per_day: default_calls_per_day(),
        }
    }
}

/// Market data provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Base URL of the exchange-rate API (key-less)
    #[serde(default = "default_market_url")]
    pub base_url: String,
    /// Base URL of the commodities price API
    #[serde(default = "default_commodities_url")]
    pub commodities_base_url: String,
    /// Commodities API key (empty = static fallback data)
    #[serde(default)]
    pub commodities_api_key: String,
    /// Outbound request timeout in milliseconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_ms: u64,
}

fn default_market_url() -> String {
    "https://api.frankfurter.app".to_string()
}

fn default_commodities_url() -> String {
    "https://api.twelvedata.com".to_string()
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: default_market_url(),
            commodities_base_url: default_commodities_url(),
            commodities_api_key: String::new(),
            timeout_ms: default_provider_timeout(),
        }
    }
}

/// AI text-generation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Inference API key (empty = rule-based fallback only)
    #[serde(default)]
    pub api_key: String,
    /// Inference API base URL
    #[serde(default = "default_ai_url")]
    pub base_url: String,
    /// Model identifier
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Maximum generated tokens per request
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    /// Outbound request timeout in milliseconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_ms: u64,
}

fn default_ai_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_ai_model() -> String {
    "mistralai/Mistral-7B-Instruct-v0.2".to_string()
}

fn default_max_new_tokens() -> u32 {
    300
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_ai_url(),
            model: default_ai_model(),
            max_new_tokens: default_max_new_tokens(),
            timeout_ms: default_provider_timeout(),
        }
    }
}

/// Stripe checkout configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    /// Secret API key
    #[serde(default)]
    pub secret_key: String,
    /// Webhook signing secret (whsec_...)
    #[serde(default)]
    pub webhook_secret: String,
    /// Maximum webhook timestamp drift in seconds for replay protection
    #[serde(default = "default_max_timestamp_drift")]
    pub max_timestamp_drift_secs: i64,
    /// Price id for the basic tier
    #[serde(default)]
    pub price_id_basic: Option<String>,
    /// Price id for the pro tier
    #[serde(default)]
    pub price_id_pro: Option<String>,
    /// Price id for the institutional tier
    #[serde(default)]
    pub price_id_institutional: Option<String>,
}

fn default_max_timestamp_drift() -> i64 {
    300
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            webhook_secret: String::new(),
            max_timestamp_drift_secs: default_max_timestamp_drift(),
            price_id_basic: None,
            price_id_pro: None,
            price_id_institutional: None,
        }
    }
}

/// Cache TTL configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whale transaction listing cache TTL in seconds
    #[serde(default = "default_transactions_ttl")]
    pub transactions_ttl_secs: i64,
    /// On-chain metrics aggregate cache TTL in seconds
    #[serde(default = "default_metrics_ttl")]
    pub metrics_ttl_secs: i64,
}

fn default_transactions_ttl() -> i64 {
    120
}

fn default_metrics_ttl() -> i64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            transactions_ttl_secs: default_transactions_ttl(),
            metrics_ttl_secs: default_metrics_ttl(),
        }
    }
}

/// Access evaluation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Developer override: pins the effective tier to institutional.
    /// Refused when environment is "production".
    #[serde(default)]
    pub dev_override: bool,
    /// Deployment environment: development, staging, production
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "development".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            dev_override: false,
            environment: default_environment(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Maximum stored notifications per user (oldest evicted beyond this)
    #[serde(default = "default_max_stored")]
    pub max_stored_per_user: usize,
    /// Outbound webhook delivery timeout in milliseconds
    #[serde(default = "default_channel_timeout")]
    pub channel_timeout_ms: u64,
}

fn default_max_stored() -> usize {
    100
}

fn default_channel_timeout() -> u64 {
    8000
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            max_stored_per_user: default_max_stored(),
            channel_timeout_ms: default_channel_timeout(),
        }
    }
}

/// Search analytics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Maximum retained search log entries (oldest truncated beyond this)
    #[serde(default = "default_max_search_logs")]
    pub max_entries: usize,
}

fn default_max_search_logs() -> usize {
    1000
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_search_logs(),
        }
    }
}

/// API rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Rate limit: max requests per second
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
    /// Rate limit: burst size
    #[serde(default = "default_api_burst")]
    pub api_burst_size: u32,
}

fn default_api_rate_limit() -> u32 {
    50
}

fn default_api_burst() -> u32 {
    100
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_rate_limit: default_api_rate_limit(),
            api_burst_size: default_api_burst(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (SHADOW_*)
    /// 2. config/config.yaml (if exists)
    /// 3. config.yaml (if exists)
    /// 4. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("cache.transactions_ttl_secs", 120)?
            .set_default("cache.metrics_ttl_secs", 300)?
            .set_default("security.api_rate_limit", 50)?
            .set_default("security.api_burst_size", 100)?
            // Load from config files (lower priority)
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config/config").required(false))
            // Override with environment variables (highest priority - loaded last)
            // SHADOW_SERVER__PORT=8081 -> server.port = 8081
            // SHADOW_STRIPE__SECRET_KEY=sk_... -> stripe.secret_key = sk_...
            .add_source(
                Environment::with_prefix("SHADOW")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // The developer override must never reach production: tier resolution
        // stays authoritative server-side there.
        if self.access.dev_override && self.access.environment == "production" {
            return Err(ConfigError::Message(
                "access.dev_override must not be enabled in production".to_string(),
            ));
        }

        if self.cache.transactions_ttl_secs <= 0 || self.cache.metrics_ttl_secs <= 0 {
            return Err(ConfigError::Message(
                "Cache TTLs must be positive".to_string(),
            ));
        }

        if self.notifications.max_stored_per_user == 0 {
            return Err(ConfigError::Message(
                "notifications.max_stored_per_user must be at least 1".to_string(),
            ));
        }

        // Checkout cannot work without a Stripe key, but read endpoints can;
        // only warn here and let the checkout path fail with a config error.
        if self.stripe.secret_key.is_empty() {
            tracing::warn!("Stripe secret key not set - checkout disabled");
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            onchain: OnChainConfig::default(),
            market: MarketConfig::default(),
            ai: AiConfig::default(),
            stripe: StripeConfig::default(),
            cache: CacheConfig::default(),
            access: AccessConfig::default(),
            notifications: NotificationsConfig::default(),
            analytics: AnalyticsConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}
