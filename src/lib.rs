//! Shadow Signals Library
//!
//! Subscription-gated crypto market intelligence service.
//! This library exposes core modules for testing.

pub mod access;
pub mod analytics;
pub mod cache;
pub mod checkout;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod providers;
pub mod signals;
pub mod tiers;

// Re-export commonly used types for tests
pub use access::AccessEvaluator;
pub use cache::TtlCache;
pub use checkout::{CheckoutOrchestrator, PaymentProvider, SubscriptionLedger};
pub use config::{AppConfig, OnChainConfig, StripeConfig};
pub use error::{AppError, AppResult};
pub use models::{Direction, OnChainSignal, Severity, SignalKind, WhaleTransaction};
pub use notifications::{NotificationEngine, NotificationStore, PreferenceStore};
pub use providers::{AiProvider, MarketDataProvider, OnChainProvider, RequestBudget};
pub use tiers::{Tier, TierId};
