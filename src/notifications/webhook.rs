//! Webhook delivery channel
//!
//! POSTs the rendered notification as JSON to the user's configured URL.
//! The request carries a bounded timeout; a non-2xx response counts as a
//! delivery failure.

use serde_json::json;
use std::time::Duration;

use super::preferences::NotificationPreferences;
use super::{Channel, DeliveryChannel, Notification};

pub struct WebhookChannel {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebhookChannel {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for WebhookChannel {
    fn channel(&self) -> Channel {
        Channel::Webhook
    }

    fn is_enabled_for(&self, prefs: &NotificationPreferences) -> bool {
        prefs.webhook_enabled && prefs.webhook_url.is_some()
    }

    async fn deliver(
        &self,
        notification: &Notification,
        prefs: &NotificationPreferences,
    ) -> anyhow::Result<()> {
        let url = prefs
            .webhook_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no webhook URL configured"))?;

        let payload = json!({
            "type": "whale_alert",
            "notification": notification,
        });

        let response = self
            .client
            .post(url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("webhook returned status {}", response.status());
        }

        tracing::debug!(
            url = %url,
            notification_id = %notification.id,
            "Webhook notification delivered"
        );
        Ok(())
    }
}
