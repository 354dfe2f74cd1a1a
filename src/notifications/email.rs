//! Email delivery channel
//!
//! No mail provider is wired up yet; delivery logs the rendered message so
//! the fan-out path and preference gating stay exercised end to end.
//! TODO: send through an actual provider once an SMTP account is
//! provisioned.

use super::preferences::NotificationPreferences;
use super::{Channel, DeliveryChannel, Notification};

pub struct EmailChannel;

impl EmailChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmailChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for EmailChannel {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn is_enabled_for(&self, prefs: &NotificationPreferences) -> bool {
        prefs.email_enabled && prefs.email.is_some()
    }

    async fn deliver(
        &self,
        notification: &Notification,
        prefs: &NotificationPreferences,
    ) -> anyhow::Result<()> {
        let recipient = prefs
            .email
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no email address configured"))?;

        tracing::info!(
            recipient = %recipient,
            notification_id = %notification.id,
            title = %notification.title,
            "Email notification dispatched"
        );
        Ok(())
    }
}
