//! Whale signal generation and on-chain metrics aggregation
//!
//! Transforms a window of whale transactions into a ranked set of
//! alert-worthy signals:
//! 1. Single-transaction signals for very large transfers
//! 2. Accumulation patterns (repeated buys from one address)
//!
//! Signals are sorted most-recent-first and capped at 20 per window.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Direction, OnChainSignal, Severity, SignalKind, WhaleTransaction};

/// Minimum USD value for a single-transaction signal
pub const SIGNAL_MIN_USD: f64 = 500_000.0;

/// USD value at which a single-transaction signal becomes critical
pub const CRITICAL_MIN_USD: f64 = 1_000_000.0;

/// Buys from one address needed for an accumulation signal
pub const ACCUMULATION_MIN_BUYS: usize = 3;

/// Maximum signals emitted per evaluation window
pub const MAX_SIGNALS: usize = 20;

/// Generate signals from a window of whale transactions
///
/// The input is expected to be pre-filtered to the caller's minimum USD
/// value. A transaction can contribute to both a single-transaction signal
/// and a pattern signal; no deduplication happens between the two passes.
pub fn generate_signals(transactions: &[WhaleTransaction]) -> Vec<OnChainSignal> {
    let mut signals = Vec::new();

    // Pass 1: single-transaction signals
    for (index, tx) in transactions.iter().enumerate() {
        if tx.value_usd < SIGNAL_MIN_USD {
            continue;
        }

        let (severity, confidence) = if tx.value_usd >= CRITICAL_MIN_USD {
            (Severity::Critical, 95)
        } else {
            (Severity::High, 85)
        };

        let kind = match tx.direction {
            Direction::Buy => SignalKind::WhaleBuy,
            Direction::Sell => SignalKind::WhaleSell,
            _ => SignalKind::LargeTransfer,
        };

        signals.push(OnChainSignal {
            id: format!("signal_{}_{}", tx.hash, index),
            kind,
            severity,
            token: tx.token_or_native(),
            description: format!(
                "Whale {} detected: {} ETH (${})",
                tx.direction,
                tx.value,
                format_usd(tx.value_usd)
            ),
            transaction: tx.clone(),
            timestamp: tx.timestamp,
            confidence,
        });
    }

    // Pass 2: accumulation patterns, keyed by buyer address
    let mut buys_by_address: HashMap<&str, Vec<&WhaleTransaction>> = HashMap::new();
    for tx in transactions
        .iter()
        .filter(|tx| tx.direction == Direction::Buy)
    {
        buys_by_address.entry(&tx.from).or_default().push(tx);
    }

    for (address, buys) in buys_by_address {
        if buys.len() < ACCUMULATION_MIN_BUYS {
            continue;
        }

        let total_usd: f64 = buys.iter().map(|tx| tx.value_usd).sum();
        // Timestamped at the earliest buy in the group
        let earliest = buys
            .iter()
            .min_by_key(|tx| tx.timestamp)
            .expect("group has at least ACCUMULATION_MIN_BUYS entries");

        signals.push(OnChainSignal {
            id: format!("accumulation_{}", address),
            kind: SignalKind::SmartMoneyAccumulation,
            severity: Severity::High,
            token: earliest.token_or_native(),
            description: format!(
                "Smart money accumulation detected: {} buys totaling ${}",
                buys.len(),
                format_usd(total_usd)
            ),
            transaction: (*earliest).clone(),
            timestamp: earliest.timestamp,
            confidence: 90,
        });
    }

    signals.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    signals.truncate(MAX_SIGNALS);
    signals
}

/// Aggregate on-chain metrics over a transaction window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainMetrics {
    pub total_whale_transactions: usize,
    #[serde(rename = "totalVolumeUSD")]
    pub total_volume_usd: f64,
    /// Top tokens by USD volume, at most 10
    pub top_tokens: Vec<TokenVolume>,
    /// Addresses with repeated activity in the window
    pub smart_money_activity: usize,
}

/// Per-token volume rollup
#[derive(Debug, Clone, Serialize)]
pub struct TokenVolume {
    pub symbol: String,
    pub address: String,
    pub volume: f64,
    pub transactions: usize,
}

/// Compute aggregate metrics from a transaction window
///
/// Token-less transfers roll up into the native ETH bucket.
pub fn compute_metrics(transactions: &[WhaleTransaction]) -> OnChainMetrics {
    let total_volume_usd: f64 = transactions.iter().map(|tx| tx.value_usd).sum();

    let mut token_map: HashMap<String, TokenVolume> = HashMap::new();
    for tx in transactions {
        let token = tx.token_or_native();
        let entry = token_map
            .entry(token.address.clone())
            .or_insert_with(|| TokenVolume {
                symbol: token.symbol,
                address: token.address,
                volume: 0.0,
                transactions: 0,
            });
        entry.volume += tx.value_usd;
        entry.transactions += 1;
    }

    let mut top_tokens: Vec<TokenVolume> = token_map.into_values().collect();
    top_tokens.sort_by(|a, b| b.volume.total_cmp(&a.volume));
    top_tokens.truncate(10);

    let mut address_activity: HashMap<&str, usize> = HashMap::new();
    for tx in transactions {
        *address_activity.entry(&tx.from).or_default() += 1;
    }
    let smart_money_activity = address_activity.values().filter(|&&n| n >= 2).count();

    OnChainMetrics {
        total_whale_transactions: transactions.len(),
        total_volume_usd,
        top_tokens,
        smart_money_activity,
    }
}

/// Format a USD amount with thousands separators, no decimals
fn format_usd(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        out.push('-');
    }
    let first_group = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - first_group) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
