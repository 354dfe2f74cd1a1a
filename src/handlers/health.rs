//! Health check endpoint

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Uptime in seconds
    pub uptime_seconds: i64,
    /// Explorer API budget
    pub api_budget: ApiBudgetHealth,
    /// Cache entry counts
    pub caches: CacheHealth,
    /// Whether checkout is configured
    pub checkout_enabled: bool,
    /// Developer tier override active
    pub dev_override: bool,
}

/// Health status enum
#[derive(Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Some systems degraded but operational
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct ApiBudgetHealth {
    pub daily_calls_used: u64,
    pub daily_calls_remaining: u64,
}

#[derive(Debug, Serialize)]
pub struct CacheHealth {
    pub feed_entries: usize,
    pub metrics_entries: usize,
}

/// Health check handler
///
/// GET /api/v1/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    let usage = state.budget.usage();

    // Degraded once the explorer budget is nearly exhausted
    let status = if usage.remaining_calls < 100 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse {
        status,
        uptime_seconds: uptime,
        api_budget: ApiBudgetHealth {
            daily_calls_used: usage.daily_call_count,
            daily_calls_remaining: usage.remaining_calls,
        },
        caches: CacheHealth {
            feed_entries: state.feed_cache.len(),
            metrics_entries: state.metrics_cache.len(),
        },
        checkout_enabled: state.checkout.is_some(),
        dev_override: state.access.is_dev_override(),
    };

    (StatusCode::OK, Json(response))
}

/// Simple health check (for load balancers)
///
/// GET /health
pub async fn health_simple() -> StatusCode {
    StatusCode::OK
}
