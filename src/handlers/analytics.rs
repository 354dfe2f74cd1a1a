//! Search analytics endpoints

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::analytics::{Period, SearchReport};
use crate::error::AppError;

/// Request body for search logging
#[derive(Debug, Deserialize)]
pub struct LogSearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct LogSearchResponse {
    pub success: bool,
}

/// Log a search query
///
/// POST /api/v1/search-analytics
pub async fn log_search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LogSearchRequest>,
) -> Result<Json<LogSearchResponse>, AppError> {
    if body.query.trim().is_empty() {
        return Err(AppError::Validation("Invalid query".to_string()));
    }

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    state.analytics.log(&body.query, user_agent);
    tracing::debug!(query = %body.query, "Search logged");

    Ok(Json(LogSearchResponse { success: true }))
}

/// Query parameters for the analytics report
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "all".to_string()
}

/// Aggregate search analytics for a reporting window
///
/// GET /api/v1/search-analytics?period=day|week|month|all
pub async fn search_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<SearchReport>, AppError> {
    let period: Period = params.period.parse()?;
    Ok(Json(state.analytics.report(period)))
}
