//! Cache-aside signed URL resolution.
//!
//! The cache is consulted first; misses are signed by the object store and
//! written back best-effort. A cache failure never fails a resolution: it
//! degrades to signing every key. Only object store failures surface.
//!
//! A URL's lifetime starts when it is signed, not when it is cached, so each
//! cache entry is written with the cache TTL minus the time signing took.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use shortcast_cache::UrlCache;
use shortcast_models::{ObjectKey, SignedUrl};
use shortcast_storage::ObjectStore;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Resolves object keys to short-lived signed URLs.
#[derive(Clone)]
pub struct MediaResolver {
    store: Arc<dyn ObjectStore>,
    cache: Arc<dyn UrlCache>,
    config: ResolverConfig,
}

impl MediaResolver {
    /// Create a resolver. Fails if cached URLs could outlive their signature.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        cache: Arc<dyn UrlCache>,
        config: ResolverConfig,
    ) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            cache,
            config,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Cache lifetime left for URLs whose signing began at `signing_started`.
    ///
    /// `None` when signing took the whole cache TTL; such URLs are returned
    /// but not cached.
    fn remaining_cache_ttl(&self, signing_started: Instant) -> Option<Duration> {
        let ttl = self.config.cache_ttl.saturating_sub(signing_started.elapsed());
        (!ttl.is_zero()).then_some(ttl)
    }

    /// Resolve one key.
    pub async fn resolve_one(&self, key: &ObjectKey) -> MediaResult<SignedUrl> {
        if key.is_empty() {
            return Err(MediaError::InvalidKey);
        }

        match self.cache.get_one(key).await {
            Ok(Some(url)) => {
                debug!(key = %key, "Signed URL cache HIT");
                metrics::record_cache_hits(1);
                return Ok(url);
            }
            Ok(None) => {
                debug!(key = %key, "Signed URL cache MISS");
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Signed URL cache read failed, signing directly");
                metrics::record_cache_error("get_one");
            }
        }
        metrics::record_cache_misses(1);

        let signing_started = Instant::now();
        let url = self
            .store
            .sign(key, self.config.url_lifetime)
            .await
            .map_err(|e| MediaError::store("sign", key, e))?;
        metrics::record_urls_signed(1);

        let Some(ttl) = self.remaining_cache_ttl(signing_started) else {
            debug!(key = %key, "Signing outlasted cache TTL, not caching");
            return Ok(url);
        };
        if let Err(e) = self.cache.set_one(key, &url, ttl).await {
            warn!(key = %key, error = %e, "Signed URL cache write failed");
            metrics::record_cache_error("set_one");
        }

        Ok(url)
    }

    /// Resolve a batch of keys.
    ///
    /// Empty keys are skipped. Duplicates are signed once. Every other input
    /// key is present in the result.
    pub async fn resolve_many(
        &self,
        keys: &[ObjectKey],
    ) -> MediaResult<HashMap<ObjectKey, SignedUrl>> {
        let mut seen = HashSet::new();
        let distinct: Vec<ObjectKey> = keys
            .iter()
            .filter(|k| !k.is_empty() && seen.insert(*k))
            .cloned()
            .collect();

        if distinct.is_empty() {
            return Ok(HashMap::new());
        }

        let mut resolved = match self.cache.get_many(&distinct).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(
                    keys = distinct.len(),
                    error = %e,
                    "Signed URL cache batch read failed, signing all keys"
                );
                metrics::record_cache_error("get_many");
                HashMap::new()
            }
        };
        resolved.retain(|key, _| seen.contains(key));

        let missing: Vec<&ObjectKey> = distinct
            .iter()
            .filter(|k| !resolved.contains_key(*k))
            .collect();

        metrics::record_cache_hits(resolved.len());
        metrics::record_cache_misses(missing.len());
        debug!(
            requested = distinct.len(),
            hits = resolved.len(),
            misses = missing.len(),
            "Resolving signed URL batch"
        );

        if missing.is_empty() {
            return Ok(resolved);
        }

        let lifetime = self.config.url_lifetime;
        let signing_started = Instant::now();
        let signed: HashMap<ObjectKey, SignedUrl> =
            try_join_all(missing.into_iter().map(|key| async move {
                self.store
                    .sign(key, lifetime)
                    .await
                    .map(|url| (key.clone(), url))
                    .map_err(|e| MediaError::store("sign", key, e))
            }))
            .await?
            .into_iter()
            .collect();
        metrics::record_urls_signed(signed.len());

        match self.remaining_cache_ttl(signing_started) {
            Some(ttl) => {
                if let Err(e) = self.cache.set_many(&signed, ttl).await {
                    warn!(keys = signed.len(), error = %e, "Signed URL cache batch write failed");
                    metrics::record_cache_error("set_many");
                }
            }
            None => debug!(keys = signed.len(), "Signing outlasted cache TTL, not caching"),
        }

        resolved.extend(signed);
        Ok(resolved)
    }

    /// Drop the cached URL for a key. Failures are logged, not returned.
    pub async fn forget(&self, key: &ObjectKey) {
        if key.is_empty() {
            return;
        }
        if let Err(e) = self.cache.invalidate(key).await {
            warn!(key = %key, error = %e, "Signed URL cache invalidation failed");
            metrics::record_cache_error("invalidate");
        }
    }

    /// Underlying object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use mockall::mock;
    use shortcast_cache::{CacheError, CacheResult, MemoryUrlCache};
    use shortcast_models::{MediaFolder, MediaUpload};
    use shortcast_storage::{MemoryObjectStore, StorageError, StorageResult};

    use super::*;

    mock! {
        pub Cache {}

        #[async_trait]
        impl UrlCache for Cache {
            async fn get_one(&self, key: &ObjectKey) -> CacheResult<Option<SignedUrl>>;
            async fn set_one(&self, key: &ObjectKey, url: &SignedUrl, ttl: Duration) -> CacheResult<()>;
            async fn get_many(&self, keys: &[ObjectKey]) -> CacheResult<HashMap<ObjectKey, SignedUrl>>;
            async fn set_many(&self, entries: &HashMap<ObjectKey, SignedUrl>, ttl: Duration) -> CacheResult<()>;
            async fn invalidate(&self, key: &ObjectKey) -> CacheResult<()>;
            async fn ping(&self) -> CacheResult<()>;
        }
    }

    /// Signs like a remote store whose reply arrives `delay` after the
    /// expiry was fixed. URLs carry their expiry in seconds since `epoch`.
    struct SlowSigner {
        epoch: Instant,
        delay: Duration,
        signs: AtomicUsize,
    }

    impl SlowSigner {
        fn new(delay: Duration) -> Self {
            Self {
                epoch: Instant::now(),
                delay,
                signs: AtomicUsize::new(0),
            }
        }

        fn now_secs(&self) -> u64 {
            self.epoch.elapsed().as_secs()
        }

        fn expires_at(url: &SignedUrl) -> u64 {
            url.as_str()
                .rsplit('=')
                .next()
                .and_then(|secs| secs.parse().ok())
                .unwrap()
        }
    }

    #[async_trait]
    impl ObjectStore for SlowSigner {
        async fn put(&self, _: &MediaUpload, _: MediaFolder) -> StorageResult<ObjectKey> {
            Err(StorageError::upload_failed("read-only"))
        }

        async fn delete(&self, key: &ObjectKey) -> StorageResult<()> {
            Err(StorageError::not_found(key.as_str()))
        }

        async fn get(&self, key: &ObjectKey) -> StorageResult<Vec<u8>> {
            Err(StorageError::not_found(key.as_str()))
        }

        async fn sign(&self, key: &ObjectKey, ttl: Duration) -> StorageResult<SignedUrl> {
            self.signs.fetch_add(1, Ordering::SeqCst);
            let expires_at = (self.epoch.elapsed() + ttl).as_secs();
            tokio::time::sleep(self.delay).await;
            Ok(SignedUrl::new(format!("slow://{key}?expires_at={expires_at}")))
        }

        async fn exists(&self, _: &ObjectKey) -> StorageResult<bool> {
            Ok(false)
        }

        async fn check_connectivity(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    fn slow_resolver(delay: Duration) -> (Arc<SlowSigner>, Arc<MemoryUrlCache>, MediaResolver) {
        let store = Arc::new(SlowSigner::new(delay));
        let cache = Arc::new(MemoryUrlCache::new());
        let config = ResolverConfig {
            url_lifetime: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(60),
        };
        let resolver = MediaResolver::new(store.clone(), cache.clone(), config).unwrap();
        (store, cache, resolver)
    }

    fn setup() -> (Arc<MemoryObjectStore>, Arc<MemoryUrlCache>, MediaResolver) {
        let store = Arc::new(MemoryObjectStore::new("podcasts"));
        let cache = Arc::new(MemoryUrlCache::new());
        let resolver =
            MediaResolver::new(store.clone(), cache.clone(), ResolverConfig::default()).unwrap();
        (store, cache, resolver)
    }

    fn keys(names: &[&str]) -> Vec<ObjectKey> {
        names.iter().map(|n| ObjectKey::from(*n)).collect()
    }

    #[tokio::test]
    async fn test_resolve_one_signs_once_within_ttl() {
        let (store, _, resolver) = setup();
        let key = ObjectKey::from("audio/1_a.mp3");

        let first = resolver.resolve_one(&key).await.unwrap();
        let second = resolver.resolve_one(&key).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.sign_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_one_resigns_after_cache_expiry() {
        let store = Arc::new(MemoryObjectStore::default());
        let config = ResolverConfig {
            url_lifetime: Duration::from_secs(120),
            cache_ttl: Duration::from_secs(60),
        };
        let resolver =
            MediaResolver::new(store.clone(), Arc::new(MemoryUrlCache::new()), config).unwrap();
        let key = ObjectKey::from("audio/1_a.mp3");

        resolver.resolve_one(&key).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        resolver.resolve_one(&key).await.unwrap();

        assert_eq!(store.sign_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_one_never_serves_url_past_its_expiry() {
        let (store, _, resolver) = slow_resolver(Duration::from_secs(5));
        let key = ObjectKey::from("audio/a");

        let first = resolver.resolve_one(&key).await.unwrap();
        assert_eq!(SlowSigner::expires_at(&first), 60);

        tokio::time::advance(Duration::from_secs(57)).await;
        assert_eq!(store.now_secs(), 62);

        let second = resolver.resolve_one(&key).await.unwrap();
        assert!(SlowSigner::expires_at(&second) > store.now_secs());
        assert_eq!(store.signs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_many_never_serves_url_past_its_expiry() {
        let (store, _, resolver) = slow_resolver(Duration::from_secs(5));
        let input = keys(&["audio/a", "covers/a"]);

        resolver.resolve_many(&input).await.unwrap();
        tokio::time::advance(Duration::from_secs(57)).await;

        let resolved = resolver.resolve_many(&input).await.unwrap();
        for url in resolved.values() {
            assert!(SlowSigner::expires_at(url) > store.now_secs(), "stale {url}");
        }
        assert_eq!(store.signs.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_entry_shortened_by_signing_time() {
        let (store, _, resolver) = slow_resolver(Duration::from_secs(5));
        let key = ObjectKey::from("audio/a");

        resolver.resolve_one(&key).await.unwrap();
        tokio::time::advance(Duration::from_secs(54)).await;
        resolver.resolve_one(&key).await.unwrap();
        assert_eq!(store.signs.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        resolver.resolve_one(&key).await.unwrap();
        assert_eq!(store.signs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slower_signing_than_cache_ttl_is_not_cached() {
        let (_, cache, resolver) = slow_resolver(Duration::from_secs(61));

        let url = resolver.resolve_one(&ObjectKey::from("audio/a")).await.unwrap();
        resolver.resolve_many(&keys(&["covers/a"])).await.unwrap();

        assert_eq!(SlowSigner::expires_at(&url), 60);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_resolve_one_rejects_empty_key() {
        let (store, _, resolver) = setup();
        let err = resolver.resolve_one(&ObjectKey::default()).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidKey));
        assert_eq!(store.sign_calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_one_surfaces_sign_failure() {
        let (store, cache, resolver) = setup();
        store.fail_signing(true).await;
        let key = ObjectKey::from("audio/1_a.mp3");

        let err = resolver.resolve_one(&key).await.unwrap_err();
        match err {
            MediaError::Store { op, key: failed, .. } => {
                assert_eq!(op, "sign");
                assert_eq!(failed, "audio/1_a.mp3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_resolve_many_empty_input() {
        let (store, _, resolver) = setup();
        let resolved = resolver.resolve_many(&[]).await.unwrap();
        assert!(resolved.is_empty());
        assert_eq!(store.sign_calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_many_signs_each_distinct_miss_once() {
        let (store, _, resolver) = setup();
        let input = keys(&["audio/a", "covers/a", "audio/a", "audio/a", "covers/a"]);

        let resolved = resolver.resolve_many(&input).await.unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(store.sign_calls(), 2);
        assert_eq!(store.sign_calls_for(&ObjectKey::from("audio/a")).await, 1);
        assert_eq!(store.sign_calls_for(&ObjectKey::from("covers/a")).await, 1);
    }

    #[tokio::test]
    async fn test_resolve_many_never_signs_cached_keys() {
        let (store, cache, resolver) = setup();
        let cached = ObjectKey::from("audio/cached");
        let cached_url = SignedUrl::new("https://cdn.test/cached");
        cache
            .set_one(&cached, &cached_url, Duration::from_secs(60))
            .await
            .unwrap();

        let input = keys(&["audio/cached", "audio/fresh"]);
        let resolved = resolver.resolve_many(&input).await.unwrap();

        assert_eq!(resolved.get(&cached), Some(&cached_url));
        assert!(resolved.contains_key(&ObjectKey::from("audio/fresh")));
        assert_eq!(store.sign_calls_for(&cached).await, 0);
        assert_eq!(store.sign_calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_many_fills_cache() {
        let (store, cache, resolver) = setup();
        let input = keys(&["audio/a", "covers/b"]);

        resolver.resolve_many(&input).await.unwrap();
        assert_eq!(cache.len().await, 2);

        resolver.resolve_many(&input).await.unwrap();
        assert_eq!(store.sign_calls(), 2);
    }

    #[tokio::test]
    async fn test_resolve_many_skips_empty_keys() {
        let (store, _, resolver) = setup();
        let input = keys(&["", "audio/a", ""]);

        let resolved = resolver.resolve_many(&input).await.unwrap();

        assert_eq!(resolved.len(), 1);
        assert!(!resolved.contains_key(&ObjectKey::default()));
        assert_eq!(store.sign_calls(), 1);

        assert!(resolver.resolve_many(&keys(&["", ""])).await.unwrap().is_empty());
        assert_eq!(store.sign_calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_one_then_many_returns_same_url() {
        let (store, _, resolver) = setup();
        let key = ObjectKey::from("covers/1_c.png");

        let single = resolver.resolve_one(&key).await.unwrap();
        let batch = resolver.resolve_many(&[key.clone()]).await.unwrap();

        assert_eq!(batch.get(&key), Some(&single));
        assert_eq!(store.sign_calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_many_surfaces_sign_failure() {
        let (store, _, resolver) = setup();
        store.fail_signing(true).await;

        let err = resolver.resolve_many(&keys(&["audio/a"])).await.unwrap_err();
        assert!(matches!(err, MediaError::Store { op: "sign", .. }));
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_swallowed() {
        let store = Arc::new(MemoryObjectStore::default());
        let mut cache = MockCache::new();
        cache.expect_get_many().returning(|_| Ok(HashMap::new()));
        cache
            .expect_set_many()
            .times(1)
            .returning(|_, _| Err(CacheError::connection_failed("connection refused")));
        let resolver =
            MediaResolver::new(store.clone(), Arc::new(cache), ResolverConfig::default()).unwrap();

        let input = keys(&["audio/a", "audio/b", "covers/c"]);
        let resolved = resolver.resolve_many(&input).await.unwrap();

        assert_eq!(resolved.len(), 3);
        for key in &input {
            assert!(resolved.contains_key(key), "missing {key}");
        }
    }

    #[tokio::test]
    async fn test_cache_outage_falls_back_to_signing() {
        let store = Arc::new(MemoryObjectStore::default());
        let mut cache = MockCache::new();
        cache
            .expect_get_one()
            .returning(|_| Err(CacheError::connection_failed("down")));
        cache
            .expect_set_one()
            .returning(|_, _, _| Err(CacheError::connection_failed("down")));
        cache
            .expect_get_many()
            .returning(|_| Err(CacheError::connection_failed("down")));
        cache
            .expect_set_many()
            .returning(|_, _| Err(CacheError::connection_failed("down")));
        cache
            .expect_invalidate()
            .returning(|_| Err(CacheError::connection_failed("down")));
        let resolver =
            MediaResolver::new(store.clone(), Arc::new(cache), ResolverConfig::default()).unwrap();

        let key = ObjectKey::from("audio/a");
        assert!(resolver.resolve_one(&key).await.is_ok());
        assert_eq!(resolver.resolve_many(&[key.clone()]).await.unwrap().len(), 1);
        resolver.forget(&key).await;

        assert_eq!(store.sign_calls(), 2);
    }

    #[tokio::test]
    async fn test_forget_forces_resign() {
        let (store, _, resolver) = setup();
        let key = ObjectKey::from("audio/a");

        resolver.resolve_one(&key).await.unwrap();
        resolver.forget(&key).await;
        resolver.resolve_one(&key).await.unwrap();

        assert_eq!(store.sign_calls(), 2);
    }

    #[test]
    fn test_new_rejects_cache_outliving_url() {
        let config = ResolverConfig {
            url_lifetime: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(61),
        };
        let result = MediaResolver::new(
            Arc::new(MemoryObjectStore::default()),
            Arc::new(MemoryUrlCache::new()),
            config,
        );
        assert!(matches!(result, Err(MediaError::InvalidConfig(_))));
    }
}
