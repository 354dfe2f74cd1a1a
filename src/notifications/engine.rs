//! Notification decision engine
//!
//! Decides for each generated signal whether a user should be notified,
//! renders the notification, and fans it out to the enabled channels.

use std::sync::Arc;
use uuid::Uuid;

use super::preferences::{NotificationPreferences, PreferenceStore};
use super::store::NotificationStore;
use super::{Channel, DeliveryChannel, Notification};
use crate::models::{OnChainSignal, SignalKind};

/// Result of processing a signal batch for one user
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub notifications_sent: usize,
    pub notification_ids: Vec<String>,
}

/// Decide whether a signal should produce a notification
///
/// All configured conditions are conjunctive:
/// - severity rank must reach the preference's minimum
/// - a non-empty token allow-list must contain the signal's token symbol
/// - the signal's local time-of-day must fall outside any quiet hours
pub fn should_notify(signal: &OnChainSignal, prefs: &NotificationPreferences) -> bool {
    if signal.severity < prefs.min_severity {
        return false;
    }

    if !prefs.tokens.is_empty() && !prefs.tokens.contains(&signal.token.symbol) {
        return false;
    }

    if let Some(quiet) = prefs.quiet_hours {
        if quiet.contains(signal.timestamp) {
            return false;
        }
    }

    true
}

/// Build the notification title for a signal
fn notification_title(signal: &OnChainSignal) -> String {
    match signal.kind {
        SignalKind::WhaleBuy => format!("🐋 Whale Buy Alert: {}", signal.token.symbol),
        SignalKind::WhaleSell => format!("🐋 Whale Sell Alert: {}", signal.token.symbol),
        SignalKind::SmartMoneyAccumulation => {
            format!("💰 Smart Money Accumulation: {}", signal.token.symbol)
        }
        SignalKind::LargeTransfer => {
            format!("📊 Large Transfer Detected: {}", signal.token.symbol)
        }
        SignalKind::UnusualVolume => format!("📈 Unusual Volume: {}", signal.token.symbol),
    }
}

/// Render a notification from a signal
///
/// The id is unique per call; the same signal processed twice produces two
/// distinct notification records.
pub fn create_notification(signal: &OnChainSignal, user_id: &str) -> Notification {
    Notification {
        id: format!("notif_{}_{}", signal.id, Uuid::new_v4().simple()),
        user_id: user_id.to_string(),
        signal_id: signal.id.clone(),
        kind: signal.kind,
        severity: signal.severity,
        title: notification_title(signal),
        message: signal.description.clone(),
        token_symbol: signal.token.symbol.clone(),
        transaction_hash: signal.transaction.hash.clone(),
        value_usd: signal.transaction.value_usd,
        timestamp: signal.timestamp,
        read: false,
        sent_via: Vec::new(),
    }
}

/// Orchestrates decision, rendering, dispatch, and storage
pub struct NotificationEngine {
    preferences: Arc<PreferenceStore>,
    store: Arc<NotificationStore>,
    channels: Vec<Arc<dyn DeliveryChannel>>,
    metrics: Option<Arc<crate::metrics::MetricsState>>,
}

impl NotificationEngine {
    pub fn new(
        preferences: Arc<PreferenceStore>,
        store: Arc<NotificationStore>,
        channels: Vec<Arc<dyn DeliveryChannel>>,
    ) -> Self {
        Self {
            preferences,
            store,
            channels,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<crate::metrics::MetricsState>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Process a signal batch for one user
    ///
    /// Preferences are loaded once for the batch. Signals are evaluated in
    /// input order, independently; no signal terminates the batch early.
    pub async fn process_signals(
        &self,
        signals: &[OnChainSignal],
        user_id: &str,
    ) -> ProcessOutcome {
        let prefs = self.preferences.get(user_id);
        let mut notification_ids = Vec::new();

        for signal in signals {
            if !should_notify(signal, &prefs) {
                continue;
            }

            let notification = create_notification(signal, user_id);
            let stored = self.dispatch(notification, &prefs).await;
            notification_ids.push(stored.id);
        }

        tracing::info!(
            user_id = %user_id,
            signals = signals.len(),
            sent = notification_ids.len(),
            "Processed signal batch"
        );

        ProcessOutcome {
            notifications_sent: notification_ids.len(),
            notification_ids,
        }
    }

    /// Fan a notification out to every enabled channel and store it
    ///
    /// Channel delivery is best-effort: a failure is logged and the
    /// remaining channels still run. The stored record keeps the set of
    /// channels that actually succeeded.
    pub async fn dispatch(
        &self,
        mut notification: Notification,
        prefs: &NotificationPreferences,
    ) -> Notification {
        let mut sent_via = Vec::new();

        if prefs.in_app_enabled {
            sent_via.push(Channel::InApp);
            if let Some(m) = &self.metrics {
                m.notifications_sent.with_label_values(&["in_app"]).inc();
            }
        }

        for channel in &self.channels {
            if !channel.is_enabled_for(prefs) {
                continue;
            }
            let name = channel.channel().to_string();
            match channel.deliver(&notification, prefs).await {
                Ok(()) => {
                    sent_via.push(channel.channel());
                    if let Some(m) = &self.metrics {
                        m.notifications_sent.with_label_values(&[&name]).inc();
                    }
                }
                Err(e) => {
                    tracing::error!(
                        channel = %name,
                        notification_id = %notification.id,
                        error = %e,
                        "Failed to deliver notification"
                    );
                    if let Some(m) = &self.metrics {
                        m.notifications_failed.with_label_values(&[&name]).inc();
                    }
                }
            }
        }

        notification.sent_via = sent_via;
        self.store.insert(notification.clone());
        notification
    }
}
