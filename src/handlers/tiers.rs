//! Tier catalog and access evaluation endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::error::AppError;
use crate::tiers::{self, Tier, TierId};

/// A catalog entry with its display price
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierEntry {
    #[serde(flatten)]
    pub tier: &'static Tier,
    pub formatted_price: String,
}

#[derive(Debug, Serialize)]
pub struct TiersResponse {
    pub tiers: Vec<TierEntry>,
}

/// The full tier catalog with formatted prices
///
/// GET /api/v1/tiers
pub async fn list_tiers(State(_state): State<Arc<AppState>>) -> Json<TiersResponse> {
    let entries = tiers::all_tiers()
        .iter()
        .map(|tier| TierEntry {
            tier,
            formatted_price: tiers::format_price(tier.price_in_pence),
        })
        .collect();

    Json(TiersResponse { tiers: entries })
}

/// Query parameters for an access check
#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    /// The user's current tier
    pub current: String,
    /// The tier the feature requires
    pub required: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub has_access: bool,
    pub effective_tier: TierId,
}

/// Whether a tier grants access to a feature gated at another tier
///
/// GET /api/v1/tiers/access?current=basic&required=pro
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AccessQuery>,
) -> Result<Json<AccessResponse>, AppError> {
    let current: TierId = params
        .current
        .parse()
        .map_err(|e: String| AppError::Validation(e))?;
    let required: TierId = params
        .required
        .parse()
        .map_err(|e: String| AppError::Validation(e))?;

    Ok(Json(AccessResponse {
        has_access: state.access.has_access(current, required),
        effective_tier: state.access.effective_tier(current),
    }))
}
