use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A buyer's stated preferences, normalized from the CRM schema.
///
/// Every scored field is optional: the scorer treats absence as
/// "no preference" and falls back to its neutral band.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuyerPreferences {
    #[serde(rename = "preferredZipCodes", default)]
    pub preferred_zip_codes: HashSet<String>,
    #[serde(rename = "desiredBeds", default)]
    pub desired_beds: Option<f64>,
    #[serde(rename = "desiredBaths", default)]
    pub desired_baths: Option<f64>,
    #[serde(rename = "downPayment", default)]
    pub down_payment: Option<f64>,
    /// Display labels only; geocoding happens outside the scorer.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "preferredLocation", default)]
    pub preferred_location: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl BuyerPreferences {
    /// Best free-text label for geocoding, in preference order.
    pub fn location_label(&self) -> Option<&str> {
        self.preferred_location
            .as_deref()
            .or(self.location.as_deref())
            .or(self.city.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// A property's attributes, normalized from the CRM schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyAttributes {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "zipCode", default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub beds: Option<f64>,
    #[serde(default)]
    pub baths: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// A buyer row from the backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub preferences: BuyerPreferences,
}

/// A property row from the backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: String,
    pub attributes: PropertyAttributes,
}

/// Result of scoring one buyer against one property.
///
/// Immutable value object; `score` is the capped sum of the four
/// sub-scores and every band stays within its documented range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub score: u8,
    #[serde(rename = "locationScore")]
    pub location_score: u8,
    #[serde(rename = "bedsScore")]
    pub beds_score: u8,
    #[serde(rename = "bathsScore")]
    pub baths_score: u8,
    #[serde(rename = "budgetScore")]
    pub budget_score: u8,
    #[serde(rename = "isPriority")]
    pub is_priority: bool,
    #[serde(rename = "distanceMiles")]
    pub distance_miles: Option<f64>,
    pub reasoning: String,
    pub highlights: Vec<String>,
    pub concerns: Vec<String>,
}

/// Deal stages, in pipeline order. Matches the dashboard's Kanban columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    #[serde(rename = "New Match")]
    NewMatch,
    #[serde(rename = "Sent to Buyer")]
    SentToBuyer,
    #[serde(rename = "Viewing Scheduled")]
    ViewingScheduled,
    #[serde(rename = "Offer Made")]
    OfferMade,
    #[serde(rename = "Under Contract")]
    UnderContract,
    #[serde(rename = "Closed")]
    Closed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::NewMatch => "New Match",
            PipelineStage::SentToBuyer => "Sent to Buyer",
            PipelineStage::ViewingScheduled => "Viewing Scheduled",
            PipelineStage::OfferMade => "Offer Made",
            PipelineStage::UnderContract => "Under Contract",
            PipelineStage::Closed => "Closed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "New Match" => Some(PipelineStage::NewMatch),
            "Sent to Buyer" => Some(PipelineStage::SentToBuyer),
            "Viewing Scheduled" => Some(PipelineStage::ViewingScheduled),
            "Offer Made" => Some(PipelineStage::OfferMade),
            "Under Contract" => Some(PipelineStage::UnderContract),
            "Closed" => Some(PipelineStage::Closed),
            _ => None,
        }
    }
}

impl Default for PipelineStage {
    fn default() -> Self {
        PipelineStage::NewMatch
    }
}

/// A persisted match row. At most one exists per (buyer, property) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    #[serde(rename = "buyerId")]
    pub buyer_id: String,
    #[serde(rename = "propertyId")]
    pub property_id: String,
    pub score: u8,
    #[serde(rename = "isPriority")]
    pub is_priority: bool,
    pub stage: PipelineStage,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "distanceMiles", default)]
    pub distance_miles: Option<f64>,
    #[serde(rename = "matchedAt")]
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

/// A match row queued for creation. Created rows start at `New Match`.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub buyer_id: String,
    pub property_id: String,
    pub score: MatchScore,
    pub stage: PipelineStage,
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

/// A score refresh for an existing match row. The stage is deliberately
/// absent: agents advance stages from the dashboard and re-runs must not
/// undo that.
#[derive(Debug, Clone)]
pub struct MatchUpdate {
    pub id: String,
    pub score: MatchScore,
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

/// Counters for one orchestrator run. Accumulated per wave, then summed,
/// so the totals are order-independent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRunStats {
    #[serde(rename = "pairsEvaluated")]
    pub pairs_evaluated: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    #[serde(rename = "belowThreshold")]
    pub below_threshold: usize,
    pub priority: usize,
    pub errors: usize,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
}

/// A geocoded point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}
