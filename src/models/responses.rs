use serde::{Deserialize, Serialize};

use crate::models::domain::MatchRunStats;

/// Response for a matching run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRunResponse {
    pub stats: MatchRunStats,
}

/// Response for a match-table clear
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearMatchesResponse {
    pub deleted: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
