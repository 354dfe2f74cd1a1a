//! Tier-based access evaluation
//!
//! Decides whether a user's current tier grants access to a feature gated
//! behind a required tier. Access is a total order over tiers; the developer
//! override pins the effective tier to institutional for local testing.
//!
//! Tier resolution is authoritative server-side: the override comes from
//! server configuration, is refused in production, and never from a client
//! supplied value.

use crate::config::AccessConfig;
use crate::tiers::TierId;

/// Access evaluator consulted before rendering gated features
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    dev_override: bool,
}

impl AccessEvaluator {
    pub fn new(config: &AccessConfig) -> Self {
        if config.dev_override {
            tracing::warn!(
                environment = %config.environment,
                "Developer override enabled - all tier checks pass"
            );
        }
        Self {
            dev_override: config.dev_override,
        }
    }

    /// Evaluator with no override (production behavior)
    pub fn production() -> Self {
        Self {
            dev_override: false,
        }
    }

    /// Check whether `current` grants access to a feature requiring `required`
    ///
    /// True iff rank(current) >= rank(required); always true under the
    /// developer override.
    pub fn has_access(&self, current: TierId, required: TierId) -> bool {
        if self.dev_override {
            return true;
        }
        current >= required
    }

    /// The tier used for display purposes given the stored tier
    ///
    /// Under the override this is pinned to institutional; otherwise the
    /// stored tier (callers default to free when nothing is stored).
    pub fn effective_tier(&self, stored: TierId) -> TierId {
        if self.dev_override {
            TierId::Institutional
        } else {
            stored
        }
    }

    /// Whether the developer override is active
    pub fn is_dev_override(&self) -> bool {
        self.dev_override
    }
}
