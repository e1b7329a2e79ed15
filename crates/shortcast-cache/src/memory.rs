//! In-process signed URL cache.
//!
//! Expiry is checked when an entry is read; there is no sweeper. An expired
//! entry stays in the map until the same key is written again.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use shortcast_models::{ObjectKey, SignedUrl};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::cache::UrlCache;
use crate::error::CacheResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    url: SignedUrl,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Lock-protected map of signed URLs.
#[derive(Debug, Default)]
pub struct MemoryUrlCache {
    entries: RwLock<HashMap<ObjectKey, CacheEntry>>,
}

impl MemoryUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl UrlCache for MemoryUrlCache {
    async fn get_one(&self, key: &ObjectKey) -> CacheResult<Option<SignedUrl>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.url.clone()))
    }

    async fn set_one(&self, key: &ObjectKey, url: &SignedUrl, ttl: Duration) -> CacheResult<()> {
        let entry = CacheEntry {
            url: url.clone(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.clone(), entry);
        Ok(())
    }

    async fn get_many(&self, keys: &[ObjectKey]) -> CacheResult<HashMap<ObjectKey, SignedUrl>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| {
                entries
                    .get(key)
                    .filter(|entry| entry.is_live(now))
                    .map(|entry| (key.clone(), entry.url.clone()))
            })
            .collect())
    }

    async fn set_many(
        &self,
        entries: &HashMap<ObjectKey, SignedUrl>,
        ttl: Duration,
    ) -> CacheResult<()> {
        let expires_at = Instant::now() + ttl;
        let mut map = self.entries.write().await;
        for (key, url) in entries {
            map.insert(
                key.clone(),
                CacheEntry {
                    url: url.clone(),
                    expires_at,
                },
            );
        }
        Ok(())
    }

    async fn invalidate(&self, key: &ObjectKey) -> CacheResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
