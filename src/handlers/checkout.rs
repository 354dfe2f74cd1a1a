//! Checkout, subscription status, and Stripe webhook endpoints

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::AppState;
use crate::checkout::{self, SubscriptionStatus};
use crate::error::AppError;

/// Request body for checkout session creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub tier_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub client_secret: String,
}

/// Create an embedded checkout session for a paid tier
///
/// POST /api/v1/checkout
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let orchestrator = state
        .checkout
        .as_ref()
        .ok_or_else(|| AppError::Config("Checkout is not configured".to_string()))?;

    let client_secret = orchestrator.start_checkout_session(&body.tier_id).await?;
    state.metrics.checkout_sessions.inc();

    Ok(Json(CheckoutResponse { client_secret }))
}

/// Query parameters for subscription status
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionQuery {
    pub customer_id: String,
}

/// Current subscription tier for a customer
///
/// GET /api/v1/subscription/status?customerId=
pub async fn subscription_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SubscriptionQuery>,
) -> Result<Json<SubscriptionStatus>, AppError> {
    let orchestrator = state
        .checkout
        .as_ref()
        .ok_or_else(|| AppError::Config("Checkout is not configured".to_string()))?;

    Ok(Json(orchestrator.subscription_status(&params.customer_id).await))
}

/// Ingest a Stripe webhook event
///
/// POST /api/v1/webhooks/stripe
///
/// The raw body is needed for signature verification, so this handler
/// takes `Bytes` rather than a typed extractor.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let orchestrator = state
        .checkout
        .as_ref()
        .ok_or_else(|| AppError::Config("Checkout is not configured".to_string()))?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Signature("Missing Stripe-Signature header".to_string()))?;

    let event = checkout::verify_webhook(
        &state.config.stripe.webhook_secret,
        signature,
        &body,
        state.config.stripe.max_timestamp_drift_secs,
    )?;

    tracing::info!(kind = %event.kind, "Stripe webhook received");
    state
        .metrics
        .webhook_events
        .with_label_values(&[&event.kind])
        .inc();

    orchestrator.handle_webhook_event(&event);
    Ok(Json(json!({ "received": true })))
}
