//! Cache boundary and configuration.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use shortcast_models::{ObjectKey, SignedUrl};

use crate::error::CacheResult;

/// Namespace isolating signed URL entries from other cached data.
pub const DEFAULT_KEY_PREFIX: &str = "signed_url:";

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL
    pub redis_url: String,
    /// Prefix prepended to every object key
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl CacheConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            key_prefix: std::env::var("SIGNED_URL_PREFIX")
                .unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string()),
        }
    }
}

/// Fast key to signed URL lookup with TTL semantics.
///
/// Reads never return an expired entry. Writes overwrite unconditionally
/// (last writer wins).
#[async_trait]
pub trait UrlCache: Send + Sync {
    /// Look up one key; `None` means absent or expired.
    async fn get_one(&self, key: &ObjectKey) -> CacheResult<Option<SignedUrl>>;

    /// Store one entry for `ttl`.
    async fn set_one(&self, key: &ObjectKey, url: &SignedUrl, ttl: Duration) -> CacheResult<()>;

    /// Look up many keys; only present, unexpired keys appear in the result.
    async fn get_many(&self, keys: &[ObjectKey]) -> CacheResult<HashMap<ObjectKey, SignedUrl>>;

    /// Store many entries for `ttl` in one batch.
    async fn set_many(
        &self,
        entries: &HashMap<ObjectKey, SignedUrl>,
        ttl: Duration,
    ) -> CacheResult<()>;

    /// Drop the entry for a key, if any.
    async fn invalidate(&self, key: &ObjectKey) -> CacheResult<()>;

    /// Check that the cache is reachable.
    async fn ping(&self) -> CacheResult<()>;
}
