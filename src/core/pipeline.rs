use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use thiserror::Error;
use uuid::Uuid;

use crate::core::distance::valid_coordinates;
use crate::core::scoring::score_match;
use crate::models::{
    BuyerRecord, MatchRunStats, MatchUpdate, NewMatch, PipelineStage, PropertyRecord,
};
use crate::services::cache::{CacheKey, CacheManager};
use crate::services::geocode::GeocodeClient;
use crate::services::store::{MatchStore, StoreError};

/// Per-request record limit on the store's write endpoints.
pub const BATCH_SIZE: usize = 10;

/// In-flight batch ceiling. Each wave of up to this many batches is
/// awaited in full before the next wave is issued.
pub const CONCURRENT_BATCHES: usize = 5;

/// Default minimum total score a pair needs to be persisted.
pub const DEFAULT_MIN_SCORE: u8 = 30;

/// Errors that abort a run outright. Per-pair and per-batch trouble is
/// counted in the run stats instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load {collection}: {source}")]
    CollectionFetch {
        collection: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("buyer not found: {0}")]
    BuyerNotFound(String),

    #[error("property not found: {0}")]
    PropertyNotFound(String),
}

/// Knobs for a single matching run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub min_score: u8,
    /// Re-score pairs that already have a match row (as updates) instead
    /// of skipping them.
    pub refresh_all: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            refresh_all: false,
        }
    }
}

/// Drives the scorer across the buyer×property cross product and keeps
/// the match table deduplicated.
///
/// One match row exists per (buyer, property) pair: pairs already in the
/// table are skipped unless `refresh_all` asks for an update pass, and
/// updates never touch the deal stage. Writes go out in batches of
/// [`BATCH_SIZE`] with at most [`CONCURRENT_BATCHES`] in flight.
pub struct MatchingPipeline {
    store: Arc<dyn MatchStore>,
    cache: Arc<CacheManager>,
    geocoder: Option<Arc<GeocodeClient>>,
}

impl MatchingPipeline {
    pub fn new(store: Arc<dyn MatchStore>, cache: Arc<CacheManager>) -> Self {
        Self {
            store,
            cache,
            geocoder: None,
        }
    }

    /// Enable coordinate backfill for buyers that only carry a free-text
    /// location.
    pub fn with_geocoder(mut self, geocoder: Arc<GeocodeClient>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Score every buyer against every property.
    pub async fn run_full(&self, options: RunOptions) -> Result<MatchRunStats, PipelineError> {
        let buyers = self.load_buyers().await?;
        let properties = self.load_properties().await?;
        self.run_pairs(buyers, properties, options).await
    }

    /// Score one buyer against every property.
    pub async fn run_for_buyer(
        &self,
        buyer_id: &str,
        options: RunOptions,
    ) -> Result<MatchRunStats, PipelineError> {
        let buyers = self.load_buyers().await?;
        let buyer = buyers
            .into_iter()
            .find(|b| b.id == buyer_id)
            .ok_or_else(|| PipelineError::BuyerNotFound(buyer_id.to_string()))?;
        let properties = self.load_properties().await?;
        self.run_pairs(vec![buyer], properties, options).await
    }

    /// Score one property against every buyer.
    pub async fn run_for_property(
        &self,
        property_id: &str,
        options: RunOptions,
    ) -> Result<MatchRunStats, PipelineError> {
        let properties = self.load_properties().await?;
        let property = properties
            .into_iter()
            .find(|p| p.id == property_id)
            .ok_or_else(|| PipelineError::PropertyNotFound(property_id.to_string()))?;
        let buyers = self.load_buyers().await?;
        self.run_pairs(buyers, vec![property], options).await
    }

    /// Delete every match row. Irreversible; callers are expected to have
    /// confirmed intent before reaching this.
    pub async fn clear_all(&self) -> Result<usize, PipelineError> {
        // Fresh ids straight from the store; a cached listing could miss
        // rows created since the cache was populated.
        let matches =
            self.store
                .fetch_matches()
                .await
                .map_err(|source| PipelineError::CollectionFetch {
                    collection: "matches",
                    source,
                })?;

        let ids: Vec<String> = matches.into_iter().map(|m| m.id).collect();
        let total = ids.len();

        let mut deleted = 0usize;
        let mut errors = 0usize;
        let chunks: Vec<&[String]> = ids.chunks(BATCH_SIZE).collect();
        for wave in chunks.chunks(CONCURRENT_BATCHES) {
            let futures = wave.iter().map(|batch| self.store.delete_matches(batch));
            for (batch, result) in wave.iter().zip(join_all(futures).await) {
                match result {
                    Ok(n) => deleted += n,
                    Err(e) => {
                        errors += batch.len();
                        tracing::warn!("Delete batch failed: {}", e);
                    }
                }
            }
        }

        self.cache.invalidate_all();

        tracing::info!(total, deleted, errors, "Cleared match table");

        Ok(deleted)
    }

    async fn run_pairs(
        &self,
        mut buyers: Vec<BuyerRecord>,
        properties: Vec<PropertyRecord>,
        options: RunOptions,
    ) -> Result<MatchRunStats, PipelineError> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        if let Some(geocoder) = self.geocoder.clone() {
            self.backfill_coordinates(&mut buyers, &geocoder).await;
        }

        let existing = self.load_matches().await?;
        let existing_by_pair: HashMap<(String, String), String> = existing
            .iter()
            .map(|m| ((m.buyer_id.clone(), m.property_id.clone()), m.id.clone()))
            .collect();

        let mut stats = MatchRunStats::default();
        let mut creates: Vec<NewMatch> = Vec::new();
        let mut updates: Vec<MatchUpdate> = Vec::new();
        let now = Utc::now();

        for buyer in &buyers {
            for property in &properties {
                let pair = (buyer.id.clone(), property.id.clone());
                let existing_id = existing_by_pair.get(&pair);

                if existing_id.is_some() && !options.refresh_all {
                    stats.skipped += 1;
                    continue;
                }

                stats.pairs_evaluated += 1;
                let score = score_match(&buyer.preferences, &property.attributes);

                if score.score < options.min_score {
                    stats.below_threshold += 1;
                    continue;
                }
                if score.is_priority {
                    stats.priority += 1;
                }

                match existing_id {
                    Some(id) => updates.push(MatchUpdate {
                        id: id.clone(),
                        score,
                        matched_at: now,
                    }),
                    None => creates.push(NewMatch {
                        buyer_id: buyer.id.clone(),
                        property_id: property.id.clone(),
                        score,
                        stage: PipelineStage::NewMatch,
                        matched_at: now,
                    }),
                }
            }
        }

        let (created, create_errors) = self.execute_creates(&creates).await;
        let (updated, update_errors) = self.execute_updates(&updates).await;
        stats.created = created;
        stats.updated = updated;
        stats.errors = create_errors + update_errors;

        // Anything written makes the cached match listing stale
        if stats.created > 0 || stats.updated > 0 {
            self.cache.delete(&CacheKey::matches()).await;
        }

        stats.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            run_id = %run_id,
            buyers = buyers.len(),
            properties = properties.len(),
            pairs_evaluated = stats.pairs_evaluated,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            below_threshold = stats.below_threshold,
            priority = stats.priority,
            errors = stats.errors,
            elapsed_ms = stats.elapsed_ms,
            "Matching run complete"
        );

        Ok(stats)
    }

    /// Issue queued creates in bounded concurrent waves. Returns
    /// (created, errored) record counts; a failed batch errors every
    /// record in it and the run keeps going.
    async fn execute_creates(&self, queue: &[NewMatch]) -> (usize, usize) {
        let mut created = 0usize;
        let mut errors = 0usize;
        let chunks: Vec<&[NewMatch]> = queue.chunks(BATCH_SIZE).collect();
        for wave in chunks.chunks(CONCURRENT_BATCHES) {
            let futures = wave.iter().map(|batch| self.store.create_matches(batch));
            for (batch, result) in wave.iter().zip(join_all(futures).await) {
                match result {
                    Ok(n) => created += n,
                    Err(e) => {
                        errors += batch.len();
                        tracing::warn!("Create batch failed: {}", e);
                    }
                }
            }
        }
        (created, errors)
    }

    async fn execute_updates(&self, queue: &[MatchUpdate]) -> (usize, usize) {
        let mut updated = 0usize;
        let mut errors = 0usize;
        let chunks: Vec<&[MatchUpdate]> = queue.chunks(BATCH_SIZE).collect();
        for wave in chunks.chunks(CONCURRENT_BATCHES) {
            let futures = wave.iter().map(|batch| self.store.update_matches(batch));
            for (batch, result) in wave.iter().zip(join_all(futures).await) {
                match result {
                    Ok(n) => updated += n,
                    Err(e) => {
                        errors += batch.len();
                        tracing::warn!("Update batch failed: {}", e);
                    }
                }
            }
        }
        (updated, errors)
    }

    /// Resolve missing buyer coordinates from their location label, one
    /// paced call at a time. Failures leave the buyer without coordinates
    /// and the scorer falls back to ZIP-only or neutral scoring.
    async fn backfill_coordinates(&self, buyers: &mut [BuyerRecord], geocoder: &GeocodeClient) {
        for buyer in buyers.iter_mut() {
            if valid_coordinates(buyer.preferences.latitude, buyer.preferences.longitude).is_some()
            {
                continue;
            }
            let label = match buyer.preferences.location_label() {
                Some(label) => label.to_string(),
                None => continue,
            };
            match geocoder.forward(&label).await {
                Ok(Some(coords)) => {
                    buyer.preferences.latitude = Some(coords.lat);
                    buyer.preferences.longitude = Some(coords.lng);
                }
                Ok(None) => {
                    tracing::debug!("No geocoding result for buyer {}", buyer.id);
                }
                Err(e) => {
                    tracing::debug!("Geocoding failed for buyer {}: {}", buyer.id, e);
                }
            }
        }
    }

    async fn load_buyers(&self) -> Result<Vec<BuyerRecord>, PipelineError> {
        let key = CacheKey::buyers();
        if let Ok(cached) = self.cache.get::<Vec<BuyerRecord>>(&key).await {
            return Ok(cached);
        }
        let buyers =
            self.store
                .fetch_buyers()
                .await
                .map_err(|source| PipelineError::CollectionFetch {
                    collection: "buyers",
                    source,
                })?;
        if let Err(e) = self.cache.set(&key, &buyers).await {
            tracing::warn!("Failed to cache buyers: {}", e);
        }
        Ok(buyers)
    }

    async fn load_properties(&self) -> Result<Vec<PropertyRecord>, PipelineError> {
        let key = CacheKey::properties();
        if let Ok(cached) = self.cache.get::<Vec<PropertyRecord>>(&key).await {
            return Ok(cached);
        }
        let properties = self.store.fetch_properties().await.map_err(|source| {
            PipelineError::CollectionFetch {
                collection: "properties",
                source,
            }
        })?;
        if let Err(e) = self.cache.set(&key, &properties).await {
            tracing::warn!("Failed to cache properties: {}", e);
        }
        Ok(properties)
    }

    async fn load_matches(&self) -> Result<Vec<crate::models::MatchRecord>, PipelineError> {
        let key = CacheKey::matches();
        if let Ok(cached) = self.cache.get::<Vec<crate::models::MatchRecord>>(&key).await {
            return Ok(cached);
        }
        let matches =
            self.store
                .fetch_matches()
                .await
                .map_err(|source| PipelineError::CollectionFetch {
                    collection: "matches",
                    source,
                })?;
        if let Err(e) = self.cache.set(&key, &matches).await {
            tracing::warn!("Failed to cache matches: {}", e);
        }
        Ok(matches)
    }
}
