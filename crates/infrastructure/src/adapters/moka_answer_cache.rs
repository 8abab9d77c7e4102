//! In-memory answer cache backed by Moka
//!
//! Thread-safe cache with TTL-based eviction. Holds final answers keyed by
//! the engine's opaque run keys, so repeated questions skip the whole
//! retrieval-and-inference protocol.

use std::time::Duration;

use application::ports::AnswerCachePort;
use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use crate::config::CacheAppConfig;

/// Moka-based answer cache
pub struct MokaAnswerCache {
    cache: Cache<String, String>,
}

impl std::fmt::Debug for MokaAnswerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaAnswerCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaAnswerCache {
    /// Create a cache sized and aged per configuration
    #[must_use]
    pub fn new(config: &CacheAppConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .build();
        Self { cache }
    }
}

#[async_trait]
impl AnswerCachePort for MokaAnswerCache {
    async fn get(&self, key: &str) -> Option<String> {
        let hit = self.cache.get(key).await;
        debug!(hit = hit.is_some(), "Answer cache lookup");
        hit
    }

    async fn put(&self, key: &str, answer: &str) {
        self.cache.insert(key.to_string(), answer.to_string()).await;
    }
}
