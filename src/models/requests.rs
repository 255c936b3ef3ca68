use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to run the full buyer×property matching pass
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunMatchingRequest {
    /// Minimum total score a pair needs to be persisted; falls back to
    /// the configured default when omitted.
    #[validate(range(max = 100))]
    #[serde(alias = "min_score", rename = "minScore", default)]
    pub min_score: Option<u8>,
    /// Re-score pairs that already have a match row instead of skipping
    /// them.
    #[serde(alias = "refresh_all", rename = "refreshAll", default)]
    pub refresh_all: bool,
}

/// Request to match one buyer against every property
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BuyerRunRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "buyer_id", rename = "buyerId")]
    pub buyer_id: String,
    #[validate(range(max = 100))]
    #[serde(alias = "min_score", rename = "minScore", default)]
    pub min_score: Option<u8>,
}

/// Request to match one property against every buyer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PropertyRunRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "property_id", rename = "propertyId")]
    pub property_id: String,
    #[validate(range(max = 100))]
    #[serde(alias = "min_score", rename = "minScore", default)]
    pub min_score: Option<u8>,
}

/// Request to wipe the match table. Deleting is irreversible, so the
/// caller has to say so explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearMatchesRequest {
    #[serde(default)]
    pub confirm: bool,
}
