//! Harbor Match - buyer/property matching service for the Harbor CRM
//!
//! This library scores buyer/property compatibility with a deterministic
//! rule-based scorer and maintains a deduplicated match table in the CRM's
//! backing store.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance::haversine_miles,
    pipeline::{MatchingPipeline, PipelineError, RunOptions},
    scoring::score_match,
};
pub use crate::models::{
    BuyerPreferences, BuyerRecord, MatchRecord, MatchRunStats, MatchScore, PropertyAttributes,
    PropertyRecord,
};
pub use crate::services::{AirtableClient, AirtableTables, CacheManager, MatchStore, StoreError};
