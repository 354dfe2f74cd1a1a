//! On-chain signal model - derived alerts over whale transactions
//!
//! Signals are always derived, never persisted as a source of truth; they
//! are regenerated from the transaction set on each evaluation window.

use serde::{Deserialize, Serialize};

use super::transaction::{TokenInfo, WhaleTransaction};

/// Signal severity, ordered for notification filtering
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric rank used for minimum-severity comparisons
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Signal classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    WhaleBuy,
    WhaleSell,
    LargeTransfer,
    SmartMoneyAccumulation,
    UnusualVolume,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::WhaleBuy => write!(f, "whale_buy"),
            SignalKind::WhaleSell => write!(f, "whale_sell"),
            SignalKind::LargeTransfer => write!(f, "large_transfer"),
            SignalKind::SmartMoneyAccumulation => write!(f, "smart_money_accumulation"),
            SignalKind::UnusualVolume => write!(f, "unusual_volume"),
        }
    }
}

/// A derived alert describing a notable on-chain event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnChainSignal {
    /// Deterministic id derived from the source transaction hash and index,
    /// or from the aggregating address for pattern signals
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub severity: Severity,
    pub token: TokenInfo,
    pub description: String,
    /// Originating transaction (earliest buy for pattern signals)
    pub transaction: WhaleTransaction,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Generator certainty, 0-100
    pub confidence: u8,
}
