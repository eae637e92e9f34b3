//! Bounded, expiring cache for research packs
//!
//! Injected into a source via [`CachingResearchSource`]; entries are evicted
//! by LRU order once capacity is reached and dropped on read once expired.

use super::{ResearchPack, ResearchSource};
use crate::models::BusinessIntake;
use crate::Result;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 128;

struct CachedPack {
    pack: ResearchPack,
    stored_at: Instant,
}

pub struct ResearchCache {
    entries: Mutex<LruCache<(String, String), CachedPack>>,
    ttl: Duration,
}

impl ResearchCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN));

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    fn key(industry: &str, location: &str) -> (String, String) {
        (industry.trim().to_lowercase(), location.trim().to_lowercase())
    }

    pub async fn get(&self, industry: &str, location: &str) -> Option<ResearchPack> {
        let key = Self::key(industry, location);
        let mut entries = self.entries.lock().await;

        let expired = match entries.get(&key) {
            Some(cached) if cached.stored_at.elapsed() < self.ttl => {
                return Some(cached.pack.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!(industry = %industry, location = %location, "Research cache entry expired");
            entries.pop(&key);
        }

        None
    }

    pub async fn insert(&self, industry: &str, location: &str, pack: ResearchPack) {
        let mut entries = self.entries.lock().await;
        entries.put(
            Self::key(industry, location),
            CachedPack {
                pack,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Wraps any research source with a [`ResearchCache`].
pub struct CachingResearchSource {
    inner: Arc<dyn ResearchSource>,
    cache: ResearchCache,
}

impl CachingResearchSource {
    pub fn new(inner: Arc<dyn ResearchSource>, cache: ResearchCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ResearchCache {
        &self.cache
    }
}

#[async_trait]
impl ResearchSource for CachingResearchSource {
    async fn fetch_market_data(
        &self,
        industry: &str,
        location: &str,
        intake: &BusinessIntake,
    ) -> Result<ResearchPack> {
        if let Some(pack) = self.cache.get(industry, location).await {
            debug!(industry = %industry, location = %location, "Research cache hit");
            return Ok(pack);
        }

        let pack = self.inner.fetch_market_data(industry, location, intake).await?;
        self.cache.insert(industry, location, pack.clone()).await;
        Ok(pack)
    }
}
