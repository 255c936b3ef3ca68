use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// TTL cache for backing-store collections
///
/// Collections are cached as serialized JSON for a bounded lifetime
/// (default 5 minutes) so repeated matching runs don't re-fetch the whole
/// base every time. A miss or an explicit invalidation falls through to a
/// direct fetch at the call site; cache trouble is never fatal.
pub struct CacheManager {
    cache: moka::future::Cache<String, Vec<u8>>,
}

impl CacheManager {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let cache = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Get a value from the cache
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: DeserializeOwned,
    {
        if let Some(bytes) = self.cache.get(key).await {
            tracing::trace!("Cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in the cache
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.cache.insert(key.to_string(), bytes).await;
        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Drop a single key
    pub async fn delete(&self, key: &str) {
        self.cache.invalidate(key).await;
        tracing::trace!("Cache invalidated: {}", key);
    }

    /// Drop everything, e.g. after a bulk clear of the match table
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
        tracing::debug!("Cache fully invalidated");
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub fn buyers() -> String {
        "buyers:all".to_string()
    }

    pub fn properties() -> String {
        "properties:all".to_string()
    }

    pub fn matches() -> String {
        "matches:all".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_get_delete() {
        let cache = CacheManager::new(100, 60);

        cache.set("k", &vec!["a".to_string()]).await.unwrap();
        let got: Vec<String> = cache.get("k").await.unwrap();
        assert_eq!(got, vec!["a".to_string()]);

        cache.delete("k").await;
        assert!(matches!(
            cache.get::<Vec<String>>("k").await,
            Err(CacheError::CacheMiss(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_expires() {
        let cache = CacheManager::new(100, 0);
        cache.set("k", &1u32).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get::<u32>("k").await.is_err());
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::buyers(), "buyers:all");
        assert_eq!(CacheKey::properties(), "properties:all");
        assert_eq!(CacheKey::matches(), "matches:all");
    }
}
