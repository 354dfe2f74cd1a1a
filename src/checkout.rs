//! Subscription checkout and Stripe webhook processing
//!
//! Checkout sessions are created through a `PaymentProvider` trait so the
//! orchestration and its validation order stay testable without Stripe.
//! Webhook events keep an in-memory ledger of customer subscriptions that
//! tier resolution reads from.

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};
use crate::tiers::{self, TierId};

/// Creates checkout sessions and lists subscriptions
#[async_trait::async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create an embedded checkout session for a price, tagging the session
    /// with the tier id, and return the opaque client secret
    async fn create_checkout_session(&self, price_id: &str, tier_id: TierId) -> AppResult<String>;

    /// The customer's active subscription, if any
    async fn active_subscription(&self, customer_id: &str) -> AppResult<Option<ProviderSubscription>>;
}

/// Subscription data as reported by the payment provider
#[derive(Debug, Clone)]
pub struct ProviderSubscription {
    pub tier: TierId,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionListResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// Stripe REST client
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> AppResult<Self> {
        if config.secret_key.is_empty() {
            return Err(AppError::Config(
                "Stripe secret key not configured".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(8))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            base_url: "https://api.stripe.com/v1".to_string(),
        })
    }
}

#[async_trait::async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(&self, price_id: &str, tier_id: TierId) -> AppResult<String> {
        let tier = tier_id.to_string();
        let params = [
            ("ui_mode", "embedded"),
            ("redirect_on_completion", "never"),
            ("mode", "subscription"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("metadata[tier]", tier.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "Stripe checkout session creation failed");
            return Err(AppError::Upstream(format!(
                "Stripe returned status {}",
                status
            )));
        }

        let session: CheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid Stripe response: {}", e)))?;

        Ok(session.client_secret)
    }

    async fn active_subscription(
        &self,
        customer_id: &str,
    ) -> AppResult<Option<ProviderSubscription>> {
        let response = self
            .client
            .get(format!("{}/subscriptions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .query(&[
                ("customer", customer_id),
                ("status", "active"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Stripe returned status {}",
                response.status()
            )));
        }

        let list: SubscriptionListResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid Stripe response: {}", e)))?;

        let Some(sub) = list.data.into_iter().next() else {
            return Ok(None);
        };

        let tier = sub
            .pointer("/metadata/tier")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or(TierId::Free);
        let status = sub
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("active")
            .to_string();
        let current_period_end = sub
            .get("current_period_end")
            .and_then(|v| v.as_i64())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        Ok(Some(ProviderSubscription {
            tier,
            status,
            current_period_end,
        }))
    }
}

/// A customer's subscription as last reported by webhooks
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub customer_id: String,
    pub subscription_id: String,
    pub tier: TierId,
    pub status: String,
    pub price_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<DateTime<Utc>>,
}

/// In-memory customer -> subscription ledger fed by webhook events
pub struct SubscriptionLedger {
    records: RwLock<HashMap<String, SubscriptionRecord>>,
}

impl SubscriptionLedger {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn upsert(&self, record: SubscriptionRecord) {
        self.records
            .write()
            .insert(record.customer_id.clone(), record);
    }

    pub fn remove(&self, customer_id: &str) {
        self.records.write().remove(customer_id);
    }

    pub fn get(&self, customer_id: &str) -> Option<SubscriptionRecord> {
        self.records.read().get(customer_id).cloned()
    }

    /// Flag the subscription as past due after a failed payment
    pub fn mark_past_due(&self, subscription_id: &str) -> bool {
        let mut records = self.records.write();
        for record in records.values_mut() {
            if record.subscription_id == subscription_id {
                record.status = "past_due".to_string();
                return true;
            }
        }
        false
    }

    /// Effective tier for a customer; Free when absent or not active
    pub fn active_tier(&self, customer_id: &str) -> TierId {
        self.records
            .read()
            .get(customer_id)
            .filter(|r| r.status == "active")
            .map(|r| r.tier)
            .unwrap_or(TierId::Free)
    }
}

impl Default for SubscriptionLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Checkout orchestration and webhook event handling
pub struct CheckoutOrchestrator {
    provider: Arc<dyn PaymentProvider>,
    config: StripeConfig,
    ledger: Arc<SubscriptionLedger>,
}

/// Current subscription state returned to the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub tier: TierId,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<DateTime<Utc>>,
}

impl CheckoutOrchestrator {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        config: StripeConfig,
        ledger: Arc<SubscriptionLedger>,
    ) -> Self {
        Self {
            provider,
            config,
            ledger,
        }
    }

    /// The configured Stripe price id for a paid tier
    fn price_id_for(&self, tier_id: TierId) -> Option<&str> {
        match tier_id {
            TierId::Free => None,
            TierId::Basic => self.config.price_id_basic.as_deref(),
            TierId::Pro => self.config.price_id_pro.as_deref(),
            TierId::Institutional => self.config.price_id_institutional.as_deref(),
        }
    }

    /// Validate the tier and create a checkout session for it
    ///
    /// Validation order is fixed: unknown tier, then free tier, then missing
    /// price configuration; only then is the provider called.
    pub async fn start_checkout_session(&self, tier_id: &str) -> AppResult<String> {
        let tier = tiers::get_tier_by_id(tier_id).ok_or_else(|| {
            AppError::NotFound(format!("Subscription tier \"{}\" not found", tier_id))
        })?;

        if tier.price_in_pence == 0 {
            return Err(AppError::InvalidOperation(
                "Cannot create checkout session for free tier".to_string(),
            ));
        }

        let price_id = self.price_id_for(tier.id).ok_or_else(|| {
            AppError::Config(format!(
                "No Stripe price id configured for tier \"{}\"",
                tier.id
            ))
        })?;

        let client_secret = self
            .provider
            .create_checkout_session(price_id, tier.id)
            .await?;

        tracing::info!(tier = %tier.id, "Checkout session created");
        Ok(client_secret)
    }

    /// Current subscription for a customer
    ///
    /// Provider errors degrade to the free tier rather than failing the
    /// request; the webhook ledger is the fallback source.
    pub async fn subscription_status(&self, customer_id: &str) -> SubscriptionStatus {
        match self.provider.active_subscription(customer_id).await {
            Ok(Some(sub)) => SubscriptionStatus {
                tier: sub.tier,
                status: sub.status,
                current_period_end: sub.current_period_end,
            },
            Ok(None) => SubscriptionStatus {
                tier: TierId::Free,
                status: "inactive".to_string(),
                current_period_end: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Subscription lookup failed, using webhook ledger");
                match self.ledger.get(customer_id) {
                    Some(record) => SubscriptionStatus {
                        tier: record.tier,
                        status: record.status,
                        current_period_end: record.current_period_end,
                    },
                    None => SubscriptionStatus {
                        tier: TierId::Free,
                        status: "error".to_string(),
                        current_period_end: None,
                    },
                }
            }
        }
    }

    /// Apply a verified webhook event to the subscription ledger
    pub fn handle_webhook_event(&self, event: &WebhookEvent) {
        match event.kind.as_str() {
            "checkout.session.completed" => {
                let object = &event.object;
                let Some(customer) = str_field(object, "customer") else {
                    tracing::warn!("checkout.session.completed without customer, ignoring");
                    return;
                };
                let price_id = object
                    .pointer("/line_items/data/0/price/id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let tier = self.tier_for_price_id(price_id);

                self.ledger.upsert(SubscriptionRecord {
                    customer_id: customer.to_string(),
                    subscription_id: str_field(object, "subscription")
                        .unwrap_or_default()
                        .to_string(),
                    tier,
                    status: "active".to_string(),
                    price_id: price_id.to_string(),
                    current_period_end: None,
                });
                tracing::info!(customer = %customer, %tier, "Checkout completed");
            }
            "customer.subscription.created" | "customer.subscription.updated" => {
                let object = &event.object;
                let Some(customer) = str_field(object, "customer") else {
                    tracing::warn!(kind = %event.kind, "Subscription event without customer");
                    return;
                };
                let price_id = object
                    .pointer("/items/data/0/price/id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let tier = self.tier_for_price_id(price_id);
                let status = str_field(object, "status").unwrap_or("active").to_string();
                let current_period_end = object
                    .get("current_period_end")
                    .and_then(|v| v.as_i64())
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

                self.ledger.upsert(SubscriptionRecord {
                    customer_id: customer.to_string(),
                    subscription_id: str_field(object, "id").unwrap_or_default().to_string(),
                    tier,
                    status: status.clone(),
                    price_id: price_id.to_string(),
                    current_period_end,
                });
                tracing::info!(customer = %customer, %tier, %status, "Subscription stored");
            }
            "customer.subscription.deleted" => {
                if let Some(customer) = str_field(&event.object, "customer") {
                    self.ledger.remove(customer);
                    tracing::info!(customer = %customer, "Subscription removed");
                }
            }
            "invoice.payment_failed" => {
                if let Some(subscription) = str_field(&event.object, "subscription") {
                    if self.ledger.mark_past_due(subscription) {
                        tracing::warn!(subscription = %subscription, "Payment failed, subscription past due");
                    }
                }
            }
            other => {
                tracing::debug!(kind = %other, "Unhandled webhook event type");
            }
        }
    }

    fn tier_for_price_id(&self, price_id: &str) -> TierId {
        if price_id.is_empty() {
            return TierId::Free;
        }
        for tier in [TierId::Basic, TierId::Pro, TierId::Institutional] {
            if self.price_id_for(tier) == Some(price_id) {
                return tier;
            }
        }
        TierId::Free
    }
}

fn str_field<'a>(object: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    object.get(key).and_then(|v| v.as_str())
}

/// A parsed, signature-verified webhook event
#[derive(Debug)]
pub struct WebhookEvent {
    pub kind: String,
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

/// Verify a Stripe webhook signature and parse the event
///
/// The `Stripe-Signature` header carries `t=<timestamp>,v1=<hex hmac>`; the
/// signature is HMAC-SHA256 over `"{t}.{body}"`. Timestamps outside the
/// drift window are rejected for replay protection.
pub fn verify_webhook(
    secret: &str,
    signature_header: &str,
    body: &[u8],
    max_drift_secs: i64,
) -> AppResult<WebhookEvent> {
    if secret.is_empty() {
        return Err(AppError::Config(
            "Stripe webhook secret not configured".to_string(),
        ));
    }

    let mut timestamp: Option<&str> = None;
    let mut signature: Option<&str> = None;
    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("v1", v)) => signature = Some(v),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::Signature("Missing timestamp in signature header".to_string()))?;
    let signature = signature
        .ok_or_else(|| AppError::Signature("Missing v1 signature in header".to_string()))?;

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| AppError::Signature("Invalid timestamp format".to_string()))?;
    let drift = (Utc::now().timestamp() - ts).abs();
    if drift > max_drift_secs {
        return Err(AppError::Signature(format!(
            "Webhook expired (drift: {}s, max: {}s)",
            drift, max_drift_secs
        )));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Signature("Invalid webhook secret".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    if !constant_time_compare(signature, &expected) {
        return Err(AppError::Signature("Invalid signature".to_string()));
    }

    let raw: RawEvent = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;

    Ok(WebhookEvent {
        kind: raw.kind,
        object: raw.data.object,
    })
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
