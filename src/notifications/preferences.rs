//! Per-user notification preferences
//!
//! Preferences are created with defaults on first access, mutated through
//! partial updates that merge field-by-field, and never deleted. The store
//! is an explicit state container injected into handlers; concurrent
//! updates are last-write-wins.

use chrono::{TimeZone, Timelike, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Severity;

/// A daily quiet-hours window in the user's local time
///
/// Minutes are counted from local midnight; a window with start > end wraps
/// around midnight (e.g. 22:00-07:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    /// Window start, minutes from local midnight (0-1439)
    pub start_minute: u16,
    /// Window end, minutes from local midnight (0-1439), exclusive
    pub end_minute: u16,
    /// User's UTC offset in minutes
    pub utc_offset_minutes: i32,
}

impl QuietHours {
    /// Whether an epoch-milliseconds timestamp falls inside the window
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        let utc = match Utc.timestamp_millis_opt(timestamp_ms).single() {
            Some(t) => t,
            None => return false,
        };
        let local_minutes = (utc.hour() as i32 * 60 + utc.minute() as i32
            + self.utc_offset_minutes)
            .rem_euclid(24 * 60) as u16;

        if self.start_minute <= self.end_minute {
            local_minutes >= self.start_minute && local_minutes < self.end_minute
        } else {
            // Wraps around midnight
            local_minutes >= self.start_minute || local_minutes < self.end_minute
        }
    }
}

/// Per-user notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: String,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub webhook_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Minimum severity to notify on
    pub min_severity: Severity,
    /// Token symbols to monitor; empty = all tokens
    pub tokens: Vec<String>,
    /// No notifications inside this window when configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
}

impl NotificationPreferences {
    /// Defaults: all channels enabled, minimum severity low, no token
    /// filter, no quiet hours.
    pub fn defaults(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            in_app_enabled: true,
            email_enabled: true,
            email: None,
            webhook_enabled: true,
            webhook_url: None,
            min_severity: Severity::Low,
            tokens: Vec::new(),
            quiet_hours: None,
        }
    }
}

/// Partial preference update; unspecified fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencePatch {
    pub in_app_enabled: Option<bool>,
    pub email_enabled: Option<bool>,
    pub email: Option<String>,
    pub webhook_enabled: Option<bool>,
    pub webhook_url: Option<String>,
    pub min_severity: Option<Severity>,
    pub tokens: Option<Vec<String>>,
    pub quiet_hours: Option<QuietHours>,
}

/// In-memory preference store
pub struct PreferenceStore {
    prefs: RwLock<HashMap<String, NotificationPreferences>>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self {
            prefs: RwLock::new(HashMap::new()),
        }
    }

    /// Get preferences for a user, falling back to defaults
    pub fn get(&self, user_id: &str) -> NotificationPreferences {
        self.prefs
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| NotificationPreferences::defaults(user_id))
    }

    /// Merge a partial update into the stored preferences
    ///
    /// Fields absent from the patch are preserved. Last write wins under
    /// concurrent updates.
    pub fn update(&self, user_id: &str, patch: PreferencePatch) -> NotificationPreferences {
        let mut prefs = self.prefs.write();
        let current = prefs
            .entry(user_id.to_string())
            .or_insert_with(|| NotificationPreferences::defaults(user_id));

        if let Some(v) = patch.in_app_enabled {
            current.in_app_enabled = v;
        }
        if let Some(v) = patch.email_enabled {
            current.email_enabled = v;
        }
        if let Some(v) = patch.email {
            current.email = Some(v);
        }
        if let Some(v) = patch.webhook_enabled {
            current.webhook_enabled = v;
        }
        if let Some(v) = patch.webhook_url {
            current.webhook_url = Some(v);
        }
        if let Some(v) = patch.min_severity {
            current.min_severity = v;
        }
        if let Some(v) = patch.tokens {
            current.tokens = v;
        }
        if let Some(v) = patch.quiet_hours {
            current.quiet_hours = Some(v);
        }

        current.clone()
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}
