//! Whale transaction model - large transfers observed on chain

use serde::{Deserialize, Serialize};

/// Direction classification of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
    Transfer,
    Defi,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Sell => write!(f, "sell"),
            Direction::Transfer => write!(f, "transfer"),
            Direction::Defi => write!(f, "defi"),
        }
    }
}

/// Token descriptor; absent on a transaction means the native chain asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub address: String,
}

impl TokenInfo {
    /// The native Ethereum asset used when a transaction has no token
    pub fn native_eth() -> Self {
        Self {
            symbol: "ETH".to_string(),
            name: "Ethereum".to_string(),
            address: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}

/// A large-value on-chain transfer from a monitored address
///
/// Produced by the on-chain data provider; immutable once created and
/// retained only for the lifetime of a cache window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleTransaction {
    /// Transaction hash (unique id)
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Value in native units, kept as the provider's decimal string
    pub value: String,
    /// Derived USD value
    #[serde(rename = "valueUSD")]
    pub value_usd: f64,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub block_number: u64,
    /// Direction classification
    #[serde(rename = "type")]
    pub direction: Direction,
    /// Token descriptor; None = native ETH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenInfo>,
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub gas_price: String,
}

impl WhaleTransaction {
    /// Token descriptor, defaulting to native ETH when absent
    pub fn token_or_native(&self) -> TokenInfo {
        self.token.clone().unwrap_or_else(TokenInfo::native_eth)
    }
}
