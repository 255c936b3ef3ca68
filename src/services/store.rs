use async_trait::async_trait;
use thiserror::Error;

use crate::models::{BuyerRecord, MatchRecord, MatchUpdate, NewMatch, PropertyRecord};

/// Errors that can occur when talking to the backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// The orchestrator's view of the backing store.
///
/// Collections are fetched whole (the store paginates internally) and
/// match rows are written in bounded batches. Each batch call is atomic
/// from the caller's perspective; there are no cross-batch transactions.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn fetch_buyers(&self) -> Result<Vec<BuyerRecord>, StoreError>;

    async fn fetch_properties(&self) -> Result<Vec<PropertyRecord>, StoreError>;

    async fn fetch_matches(&self) -> Result<Vec<MatchRecord>, StoreError>;

    /// Create up to one batch of match rows. Returns the number created.
    async fn create_matches(&self, batch: &[NewMatch]) -> Result<usize, StoreError>;

    /// Refresh score/notes/timestamp on existing rows. The stage field is
    /// never written here. Returns the number updated.
    async fn update_matches(&self, batch: &[MatchUpdate]) -> Result<usize, StoreError>;

    /// Delete match rows by id. Returns the number deleted.
    async fn delete_matches(&self, ids: &[String]) -> Result<usize, StoreError>;
}
