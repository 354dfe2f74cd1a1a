//! Notification subsystem
//!
//! Turns accepted on-chain signals into per-user notifications:
//! - `preferences`: per-user channel enablement and thresholds
//! - `engine`: decision predicate, rendering, and batch processing
//! - `store`: bounded in-memory notification list with read-state tracking
//! - `email` / `webhook`: delivery channels behind a common trait

pub mod email;
pub mod engine;
pub mod preferences;
pub mod store;
pub mod webhook;

pub use email::EmailChannel;
pub use engine::{NotificationEngine, ProcessOutcome};
pub use preferences::{NotificationPreferences, PreferencePatch, PreferenceStore, QuietHours};
pub use store::NotificationStore;
pub use webhook::WebhookChannel;

use serde::{Deserialize, Serialize};

use crate::models::{Severity, SignalKind};

/// Delivery channel identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
    Webhook,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::InApp => write!(f, "in_app"),
            Channel::Email => write!(f, "email"),
            Channel::Webhook => write!(f, "webhook"),
        }
    }
}

/// A rendered notification delivered to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    /// Originating signal id
    pub signal_id: String,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub token_symbol: String,
    pub transaction_hash: String,
    #[serde(rename = "valueUSD")]
    pub value_usd: f64,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub read: bool,
    /// Channels the notification was actually delivered on
    pub sent_via: Vec<Channel>,
}

/// A delivery channel for rendered notifications
///
/// Delivery is best-effort and independent per channel: one channel failing
/// never prevents delivery on the others, and failures are not retried.
#[async_trait::async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Which channel this implementation delivers on
    fn channel(&self) -> Channel;

    /// Whether the user's preferences enable this channel
    fn is_enabled_for(&self, prefs: &NotificationPreferences) -> bool;

    /// Deliver the notification
    async fn deliver(
        &self,
        notification: &Notification,
        prefs: &NotificationPreferences,
    ) -> anyhow::Result<()>;
}
