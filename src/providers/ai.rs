//! Transaction pattern analysis
//!
//! Uses a hosted text-generation model when an API key is configured and
//! degrades to a rule-based read of buy/sell flow when the model is
//! unavailable or returns something unparseable. Callers always get an
//! analysis; only the confidence differs.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::config::AiConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Direction, OnChainSignal, Severity, SignalKind, WhaleTransaction};
use crate::providers::AiProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Bullish => write!(f, "bullish"),
            Sentiment::Bearish => write!(f, "bearish"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Analysis of a whale transaction set for one token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub sentiment: Sentiment,
    pub confidence: u8,
    pub reasoning: String,
    pub recommendation: Recommendation,
    pub key_insights: Vec<String>,
    pub risk_level: RiskLevel,
}

/// Aggregate sentiment over a signal batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSummary {
    pub overall_sentiment: Sentiment,
    pub critical_signals: Vec<OnChainSignal>,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

pub struct AiAnalyzer {
    client: reqwest::Client,
    config: AiConfig,
}

impl AiAnalyzer {
    pub fn new(config: AiConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn call_model(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/{}", self.config.base_url, self.config.model);
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": self.config.max_new_tokens,
                "temperature": 0.7,
                "return_full_text": false,
            },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Inference request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Inference API returned status {}",
                response.status()
            )));
        }

        let results: Vec<GeneratedText> = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid inference response: {}", e)))?;

        results
            .into_iter()
            .next()
            .map(|r| r.generated_text)
            .ok_or_else(|| AppError::Upstream("Empty inference response".to_string()))
    }
}

#[async_trait::async_trait]
impl AiProvider for AiAnalyzer {
    async fn analyze_transactions(
        &self,
        transactions: &[WhaleTransaction],
        token_symbol: &str,
    ) -> AppResult<AiAnalysis> {
        if transactions.is_empty() {
            return Err(AppError::Validation(
                "no transactions to analyze".to_string(),
            ));
        }

        if self.config.api_key.is_empty() {
            return Ok(rule_based_analysis(transactions, token_symbol));
        }

        let prompt = build_prompt(transactions, token_symbol);
        match self.call_model(&prompt).await {
            Ok(text) => Ok(parse_model_response(&text, transactions, token_symbol)),
            Err(e) => {
                tracing::warn!(error = %e, "Model analysis failed, using rule-based fallback");
                Ok(rule_based_analysis(transactions, token_symbol))
            }
        }
    }

    fn summarize_signals(&self, signals: &[OnChainSignal]) -> SignalSummary {
        summarize_signals(signals)
    }
}

struct FlowStats {
    buy_count: usize,
    sell_count: usize,
    transfer_count: usize,
    buy_volume: f64,
    sell_volume: f64,
}

impl FlowStats {
    fn from(transactions: &[WhaleTransaction]) -> Self {
        let mut stats = Self {
            buy_count: 0,
            sell_count: 0,
            transfer_count: 0,
            buy_volume: 0.0,
            sell_volume: 0.0,
        };
        for tx in transactions {
            match tx.direction {
                Direction::Buy => {
                    stats.buy_count += 1;
                    stats.buy_volume += tx.value_usd;
                }
                Direction::Sell => {
                    stats.sell_count += 1;
                    stats.sell_volume += tx.value_usd;
                }
                Direction::Transfer => stats.transfer_count += 1,
                Direction::Defi => {}
            }
        }
        stats
    }

    fn net_flow(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }

    fn buy_sell_ratio(&self) -> f64 {
        if self.sell_count > 0 {
            self.buy_count as f64 / self.sell_count as f64
        } else {
            self.buy_count as f64
        }
    }
}

fn build_prompt(transactions: &[WhaleTransaction], token_symbol: &str) -> String {
    let stats = FlowStats::from(transactions);
    let total: f64 = transactions.iter().map(|tx| tx.value_usd).sum();
    let avg = total / transactions.len() as f64;

    format!(
        "You are a professional on-chain analyst. Analyze the following whale \
         transaction data and provide insights.\n\n\
         Token: {token_symbol}\n\
         Total Transactions: {}\n\
         - Buys: {} (Total: ${:.0})\n\
         - Sells: {} (Total: ${:.0})\n\
         - Transfers: {}\n\
         Average Transaction Size: ${:.0}\n\
         Net Flow: ${:.0}\n\n\
         Format your response as JSON with keys: sentiment, recommendation, \
         insights (array), riskLevel, reasoning.",
        transactions.len(),
        stats.buy_count,
        stats.buy_volume,
        stats.sell_count,
        stats.sell_volume,
        stats.transfer_count,
        avg,
        stats.net_flow(),
    )
}

/// Best-effort extraction of the model's JSON answer; keyword scan when the
/// JSON is malformed, rule-based analysis when nothing is salvageable.
fn parse_model_response(
    text: &str,
    transactions: &[WhaleTransaction],
    token_symbol: &str,
) -> AiAnalysis {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&text[start..=end]) {
                let sentiment = match parsed.get("sentiment").and_then(|v| v.as_str()) {
                    Some("bullish") => Sentiment::Bullish,
                    Some("bearish") => Sentiment::Bearish,
                    _ => Sentiment::Neutral,
                };
                let recommendation = match parsed.get("recommendation").and_then(|v| v.as_str()) {
                    Some("strong_buy") => Recommendation::StrongBuy,
                    Some("buy") => Recommendation::Buy,
                    Some("sell") => Recommendation::Sell,
                    Some("strong_sell") => Recommendation::StrongSell,
                    _ => Recommendation::Hold,
                };
                let risk_level = match parsed.get("riskLevel").and_then(|v| v.as_str()) {
                    Some("low") => RiskLevel::Low,
                    Some("high") => RiskLevel::High,
                    _ => RiskLevel::Medium,
                };
                let key_insights = parsed
                    .get("insights")
                    .and_then(|v| v.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str().map(String::from))
                            .collect::<Vec<_>>()
                    })
                    .filter(|v: &Vec<String>| !v.is_empty())
                    .unwrap_or_else(|| vec![truncate(text, 100)]);

                return AiAnalysis {
                    sentiment,
                    confidence: 75,
                    reasoning: parsed
                        .get("reasoning")
                        .and_then(|v| v.as_str())
                        .map(String::from)
                        .unwrap_or_else(|| truncate(text, 200)),
                    recommendation,
                    key_insights,
                    risk_level,
                };
            }
        }
    }

    let lower = text.to_lowercase();
    if lower.contains("bullish") || lower.contains("accumulation") {
        AiAnalysis {
            sentiment: Sentiment::Bullish,
            confidence: 70,
            reasoning: truncate(text, 200),
            recommendation: if lower.contains("strong") {
                Recommendation::StrongBuy
            } else {
                Recommendation::Buy
            },
            key_insights: vec![truncate(text, 150)],
            risk_level: RiskLevel::Medium,
        }
    } else if lower.contains("bearish") || lower.contains("distribution") {
        AiAnalysis {
            sentiment: Sentiment::Bearish,
            confidence: 70,
            reasoning: truncate(text, 200),
            recommendation: if lower.contains("strong") {
                Recommendation::StrongSell
            } else {
                Recommendation::Sell
            },
            key_insights: vec![truncate(text, 150)],
            risk_level: RiskLevel::Medium,
        }
    } else {
        rule_based_analysis(transactions, token_symbol)
    }
}

/// Deterministic analysis from buy/sell flow, used when no model is
/// reachable
fn rule_based_analysis(transactions: &[WhaleTransaction], _token_symbol: &str) -> AiAnalysis {
    let stats = FlowStats::from(transactions);
    let net_flow = stats.net_flow();
    let ratio = stats.buy_sell_ratio();

    let (sentiment, recommendation, risk_level) = if net_flow > 1_000_000.0 && ratio > 2.0 {
        (Sentiment::Bullish, Recommendation::Buy, RiskLevel::Low)
    } else if net_flow < -1_000_000.0 && ratio < 0.5 {
        (Sentiment::Bearish, Recommendation::Sell, RiskLevel::High)
    } else {
        (Sentiment::Neutral, Recommendation::Hold, RiskLevel::Medium)
    };

    let mut key_insights = vec![
        format!(
            "{} whale buy transactions vs {} sell transactions",
            stats.buy_count, stats.sell_count
        ),
        format!(
            "Net flow: ${:.0} ({})",
            net_flow,
            if net_flow > 0.0 {
                "accumulation"
            } else {
                "distribution"
            }
        ),
        format!("Buy/Sell ratio: {:.2}", ratio),
    ];
    if transactions.len() >= 10 {
        key_insights
            .push("High whale activity detected - significant interest in this token".to_string());
    }

    AiAnalysis {
        sentiment,
        confidence: 65,
        reasoning: format!(
            "Based on {} whale transactions with net flow of ${:.0}",
            transactions.len(),
            net_flow
        ),
        recommendation,
        key_insights,
        risk_level,
    }
}

fn summarize_signals(signals: &[OnChainSignal]) -> SignalSummary {
    let critical_signals: Vec<OnChainSignal> = signals
        .iter()
        .filter(|s| s.severity >= Severity::High)
        .take(5)
        .cloned()
        .collect();

    let buys = signals
        .iter()
        .filter(|s| s.kind == SignalKind::WhaleBuy)
        .count();
    let sells = signals
        .iter()
        .filter(|s| s.kind == SignalKind::WhaleSell)
        .count();
    let accumulation = signals
        .iter()
        .filter(|s| s.kind == SignalKind::SmartMoneyAccumulation)
        .count();

    let overall_sentiment = if buys as f64 > sells as f64 * 1.5 || accumulation >= 2 {
        Sentiment::Bullish
    } else if sells as f64 > buys as f64 * 1.5 {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    };

    let summary = format!(
        "Detected {} signals: {} whale buys, {} whale sells, {} accumulation patterns. \
         Overall sentiment: {}.",
        signals.len(),
        buys,
        sells,
        accumulation,
        overall_sentiment
    );

    SignalSummary {
        overall_sentiment,
        critical_signals,
        summary,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
