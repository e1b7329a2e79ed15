//! Redis-backed signed URL cache.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use shortcast_models::{ObjectKey, SignedUrl};
use tracing::debug;

use crate::cache::{CacheConfig, UrlCache};
use crate::error::{CacheError, CacheResult};

/// Signed URL cache stored in Redis with per-entry expiry.
#[derive(Clone)]
pub struct RedisUrlCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisUrlCache {
    /// Create a new cache. No connection is made until first use.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self {
            client,
            key_prefix: config.key_prefix,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> CacheResult<Self> {
        Self::new(CacheConfig::from_env())
    }

    /// Namespaced Redis key for an object key.
    pub fn cache_key(&self, key: &ObjectKey) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn connection(&self) -> CacheResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::connection_failed(e.to_string()))
    }
}

/// Expiry in milliseconds; Redis rejects a zero expiry.
fn ttl_millis(ttl: Duration) -> u64 {
    ttl.as_millis().clamp(1, u64::MAX as u128) as u64
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get_one(&self, key: &ObjectKey) -> CacheResult<Option<SignedUrl>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GET")
            .arg(self.cache_key(key))
            .query_async(&mut conn)
            .await?;
        Ok(value.map(SignedUrl::new))
    }

    async fn set_one(&self, key: &ObjectKey, url: &SignedUrl, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("SET")
            .arg(self.cache_key(key))
            .arg(url.as_str())
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get_many(&self, keys: &[ObjectKey]) -> CacheResult<HashMap<ObjectKey, SignedUrl>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let cache_keys: Vec<String> = keys.iter().map(|k| self.cache_key(k)).collect();
        let mut conn = self.connection().await?;
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&cache_keys)
            .query_async(&mut conn)
            .await?;

        if values.len() != keys.len() {
            return Err(CacheError::UnexpectedReply(format!(
                "MGET returned {} values for {} keys",
                values.len(),
                keys.len()
            )));
        }

        let found: HashMap<_, _> = keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|url| (key.clone(), SignedUrl::new(url))))
            .collect();

        debug!(requested = keys.len(), found = found.len(), "Redis MGET");
        Ok(found)
    }

    async fn set_many(
        &self,
        entries: &HashMap<ObjectKey, SignedUrl>,
        ttl: Duration,
    ) -> CacheResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let millis = ttl_millis(ttl);
        let mut pipe = redis::pipe();
        for (key, url) in entries {
            pipe.cmd("SET")
                .arg(self.cache_key(key))
                .arg(url.as_str())
                .arg("PX")
                .arg(millis)
                .ignore();
        }

        let mut conn = self.connection().await?;
        pipe.query_async::<()>(&mut conn).await?;
        debug!(count = entries.len(), "Redis pipelined SET");
        Ok(())
    }

    async fn invalidate(&self, key: &ObjectKey) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("DEL")
            .arg(self.cache_key(key))
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
