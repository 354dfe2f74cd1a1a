//! Subscription tier registry
//!
//! Static catalog of the four subscription tiers. The catalog is the source
//! of truth for pricing and feature limits and is fixed at process start.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Subscription tier identifiers, ordered by rank
///
/// The derived ordering is the access hierarchy:
/// free < basic < pro < institutional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierId {
    Free,
    Basic,
    Pro,
    Institutional,
}

impl TierId {
    /// Numeric rank in the tier hierarchy
    pub fn rank(&self) -> u8 {
        match self {
            TierId::Free => 0,
            TierId::Basic => 1,
            TierId::Pro => 2,
            TierId::Institutional => 3,
        }
    }

    /// All tiers in ascending rank order
    pub fn all() -> [TierId; 4] {
        [
            TierId::Free,
            TierId::Basic,
            TierId::Pro,
            TierId::Institutional,
        ]
    }
}

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierId::Free => write!(f, "free"),
            TierId::Basic => write!(f, "basic"),
            TierId::Pro => write!(f, "pro"),
            TierId::Institutional => write!(f, "institutional"),
        }
    }
}

impl std::str::FromStr for TierId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(TierId::Free),
            "basic" => Ok(TierId::Basic),
            "pro" => Ok(TierId::Pro),
            "institutional" => Ok(TierId::Institutional),
            _ => Err(format!("Unknown tier: {}", s)),
        }
    }
}

/// Feature limits attached to a tier
#[derive(Debug, Clone, Serialize)]
pub struct TierLimits {
    /// Whale alerts per day; None = unlimited
    pub whale_alerts_per_day: Option<u32>,
    /// Supported blockchains
    pub chains: &'static [&'static str],
    /// Minimum transaction size surfaced, in USD
    pub min_transaction_usd: f64,
    /// Days of historical data
    pub historical_days: u32,
    /// AI-powered analysis available
    pub ai_analysis: bool,
    /// Custom alert rules available
    pub custom_alerts: bool,
    /// API access available
    pub api_access: bool,
}

/// A subscription tier with pricing and limits
#[derive(Debug, Clone, Serialize)]
pub struct Tier {
    pub id: TierId,
    pub name: &'static str,
    pub description: &'static str,
    /// Price in minor currency units (pence) per month
    pub price_in_pence: u32,
    pub limits: TierLimits,
}

/// The fixed tier catalog
static TIER_CATALOG: Lazy<[Tier; 4]> = Lazy::new(|| {
    [
        Tier {
            id: TierId::Free,
            name: "Free",
            description: "Basic whale tracking for Ethereum",
            price_in_pence: 0,
            limits: TierLimits {
                whale_alerts_per_day: Some(5),
                chains: &["ethereum"],
                min_transaction_usd: 500_000.0,
                historical_days: 1,
                ai_analysis: false,
                custom_alerts: false,
                api_access: false,
            },
        },
        Tier {
            id: TierId::Basic,
            name: "Basic",
            description: "Enhanced whale tracking with AI insights",
            price_in_pence: 2300,
            limits: TierLimits {
                whale_alerts_per_day: Some(50),
                chains: &["ethereum", "bsc"],
                min_transaction_usd: 100_000.0,
                historical_days: 7,
                ai_analysis: true,
                custom_alerts: false,
                api_access: false,
            },
        },
        Tier {
            id: TierId::Pro,
            name: "Pro",
            description: "Advanced multi-chain tracking with custom alerts",
            price_in_pence: 7900,
            limits: TierLimits {
                whale_alerts_per_day: None,
                chains: &["ethereum", "bsc", "polygon", "arbitrum"],
                min_transaction_usd: 50_000.0,
                historical_days: 30,
                ai_analysis: true,
                custom_alerts: true,
                api_access: false,
            },
        },
        Tier {
            id: TierId::Institutional,
            name: "Institutional",
            description: "Enterprise-grade analytics with API access",
            price_in_pence: 39_900,
            limits: TierLimits {
                whale_alerts_per_day: None,
                chains: &[
                    "ethereum",
                    "bsc",
                    "polygon",
                    "arbitrum",
                    "avalanche",
                    "fantom",
                    "optimism",
                ],
                min_transaction_usd: 10_000.0,
                historical_days: 90,
                ai_analysis: true,
                custom_alerts: true,
                api_access: true,
            },
        },
    ]
});

/// All tiers in ascending rank order
pub fn all_tiers() -> &'static [Tier] {
    &*TIER_CATALOG
}

/// Look up a tier by identifier
pub fn get_tier(id: TierId) -> &'static Tier {
    &TIER_CATALOG[id.rank() as usize]
}

/// Look up a tier by its string identifier
///
/// Any identifier outside the enumeration is a miss, not an error.
pub fn get_tier_by_id(tier_id: &str) -> Option<&'static Tier> {
    let id: TierId = tier_id.parse().ok()?;
    Some(get_tier(id))
}

/// Format a price in pence for display
///
/// Zero maps to a literal "Free"; otherwise "£<amount>/mo" with no decimals.
pub fn format_price(price_in_pence: u32) -> String {
    if price_in_pence == 0 {
        return "Free".to_string();
    }
    format!("£{}/mo", price_in_pence / 100)
}
