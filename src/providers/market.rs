//! Forex and commodities quotes
//!
//! Forex rates come from a key-less exchange-rate API; commodities require
//! an API key and fall back to a static table without one. Daily change is
//! simulated with small jitter because neither provider exposes a
//! previous-close comparison on the free tier.

use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::MarketConfig;
use crate::error::{AppError, AppResult};
use crate::providers::{MarketDataProvider, MarketQuote};

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct CommodityPrice {
    #[serde(default)]
    price: Option<String>,
}

pub struct MarketClient {
    client: reqwest::Client,
    config: MarketConfig,
}

impl MarketClient {
    pub fn new(config: MarketConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for MarketClient {
    async fn forex(&self) -> AppResult<Vec<MarketQuote>> {
        let url = format!(
            "{}/latest?from=USD&to=EUR,GBP,JPY,CHF,AUD,CAD,NZD,CNY",
            self.config.base_url
        );

        let response: FrankfurterResponse = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Forex request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid forex response: {}", e)))?;

        let rates = response.rates;
        let pair = |symbol: &str, name: &str, ccy: &str, invert: bool, decimals: usize, fallback: &str, sentiment: &str, icon: &str| {
            let price = rates
                .get(ccy)
                .map(|r| {
                    let v = if invert { 1.0 / r } else { *r };
                    format!("{:.*}", decimals, v)
                })
                .unwrap_or_else(|| fallback.to_string());
            MarketQuote {
                symbol: symbol.to_string(),
                name: name.to_string(),
                price,
                change: simulated_change(),
                sentiment: sentiment.to_string(),
                icon: icon.to_string(),
            }
        };

        Ok(vec![
            pair("EURUSD", "EUR/USD", "EUR", true, 5, "1.08500", "Bullish", "💶"),
            pair("GBPUSD", "GBP/USD", "GBP", true, 5, "1.26500", "Bullish", "💷"),
            pair("USDJPY", "USD/JPY", "JPY", false, 3, "149.500", "Neutral", "💴"),
            pair("USDCHF", "USD/CHF", "CHF", false, 5, "0.88500", "Bearish", "🇨🇭"),
            pair("AUDUSD", "AUD/USD", "AUD", true, 5, "0.65500", "Neutral", "🇦🇺"),
            pair("USDCAD", "USD/CAD", "CAD", false, 5, "1.35500", "Bullish", "🇨🇦"),
            pair("NZDUSD", "NZD/USD", "NZD", true, 5, "0.60500", "Bullish", "🇳🇿"),
            pair("CNYUSD", "CNY/USD", "CNY", true, 5, "0.13500", "Bearish", "🇨🇳"),
        ])
    }

    async fn commodities(&self) -> AppResult<Vec<MarketQuote>> {
        if self.config.commodities_api_key.is_empty() {
            return Err(AppError::Config(
                "no commodities API key configured".to_string(),
            ));
        }

        let symbols = [
            ("XAU/USD", "XAUUSD", "Gold", "3884.00", "Bullish", "🥇"),
            ("XAG/USD", "XAGUSD", "Silver", "32.15", "Bullish", "🥈"),
            ("BRENT/USD", "BRENTUSD", "Brent Crude", "72.80", "Neutral", "🛢️"),
            ("NG/USD", "NGUSD", "Natural Gas", "3.12", "Bearish", "🔥"),
            ("HG/USD", "HGUSD", "Copper", "4.18", "Neutral", "🔶"),
            ("WHEAT/USD", "WHEATUSD", "Wheat", "5.55", "Neutral", "🌾"),
        ];

        let mut quotes = Vec::with_capacity(symbols.len());
        for (api_symbol, symbol, name, fallback, sentiment, icon) in symbols {
            let url = format!(
                "{}/price?symbol={}&apikey={}",
                self.config.commodities_base_url, api_symbol, self.config.commodities_api_key
            );
            let price = match self.client.get(&url).send().await {
                Ok(resp) => resp
                    .json::<CommodityPrice>()
                    .await
                    .ok()
                    .and_then(|p| p.price)
                    .unwrap_or_else(|| fallback.to_string()),
                Err(e) => {
                    return Err(AppError::Upstream(format!(
                        "Commodities request failed: {}",
                        e
                    )))
                }
            };

            quotes.push(MarketQuote {
                symbol: symbol.to_string(),
                name: name.to_string(),
                price,
                change: simulated_change(),
                sentiment: sentiment.to_string(),
                icon: icon.to_string(),
            });
        }

        Ok(quotes)
    }
}

/// Random daily change in the -1%..+1% band, signed and formatted
fn simulated_change() -> String {
    let change = (rand::thread_rng().gen::<f64>() - 0.5) * 2.0;
    if change >= 0.0 {
        format!("+{:.2}%", change)
    } else {
        format!("{:.2}%", change)
    }
}

/// Static forex table served when the provider is unreachable
pub fn fallback_forex() -> Vec<MarketQuote> {
    static_quotes(&[
        ("EURUSD", "EUR/USD", "1.08500", "+0.25%", "Bullish", "💶"),
        ("GBPUSD", "GBP/USD", "1.26500", "+0.35%", "Bullish", "💷"),
        ("USDJPY", "USD/JPY", "149.500", "-0.15%", "Neutral", "💴"),
        ("USDCHF", "USD/CHF", "0.88500", "-0.20%", "Bearish", "🇨🇭"),
        ("AUDUSD", "AUD/USD", "0.65500", "+0.10%", "Neutral", "🇦🇺"),
        ("USDCAD", "USD/CAD", "1.35500", "+0.15%", "Bullish", "🇨🇦"),
        ("NZDUSD", "NZD/USD", "0.60500", "+0.10%", "Bullish", "🇳🇿"),
        ("CNYUSD", "CNY/USD", "0.13500", "-0.15%", "Bearish", "🇨🇳"),
    ])
}

/// Static commodities table served without an API key or on failure
pub fn fallback_commodities() -> Vec<MarketQuote> {
    static_quotes(&[
        ("XAUUSD", "Gold", "3884.00", "+0.45%", "Bullish", "🥇"),
        ("XAGUSD", "Silver", "32.15", "+0.30%", "Bullish", "🥈"),
        ("BRENTUSD", "Brent Crude", "72.80", "-0.25%", "Neutral", "🛢️"),
        ("NGUSD", "Natural Gas", "3.12", "-0.40%", "Bearish", "🔥"),
        ("HGUSD", "Copper", "4.18", "+0.15%", "Neutral", "🔶"),
        ("WHEATUSD", "Wheat", "5.55", "+0.05%", "Neutral", "🌾"),
    ])
}

fn static_quotes(rows: &[(&str, &str, &str, &str, &str, &str)]) -> Vec<MarketQuote> {
    rows.iter()
        .map(|&(symbol, name, price, change, sentiment, icon)| MarketQuote {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price: price.to_string(),
            change: change.to_string(),
            sentiment: sentiment.to_string(),
            icon: icon.to_string(),
        })
        .collect()
}
