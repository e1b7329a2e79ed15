//! Application state.

use std::sync::Arc;

use anyhow::Context;
use shortcast_cache::{MemoryUrlCache, RedisUrlCache, UrlCache};
use shortcast_catalog::{MemoryPodcastRepository, PaginationConfig, Paginator, PodcastRepository, PodcastService};
use shortcast_media::{MediaResolver, MediaResult, ResolverConfig};
use shortcast_storage::{MemoryObjectStore, ObjectStore, R2Client};
use tracing::{info, warn};

use crate::config::{ApiConfig, CacheBackend, StorageBackend};

/// Shared application state.
///
/// Every client is built here and handed down explicitly.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn ObjectStore>,
    pub cache: Arc<dyn UrlCache>,
    pub podcasts: PodcastService,
}

impl AppState {
    /// Create application state from the environment.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn ObjectStore> = match config.storage_backend {
            StorageBackend::R2 => {
                let client = R2Client::from_env()
                    .await
                    .context("failed to configure R2 storage")?;
                info!(bucket = client.bucket(), "Using R2 object storage");
                Arc::new(client)
            }
            StorageBackend::Memory => {
                warn!("Using in-memory object storage, objects will not persist");
                Arc::new(MemoryObjectStore::default())
            }
        };

        let cache: Arc<dyn UrlCache> = match config.cache_backend {
            CacheBackend::Redis => {
                Arc::new(RedisUrlCache::from_env().context("failed to configure Redis cache")?)
            }
            CacheBackend::Memory => {
                info!("Using in-memory signed URL cache");
                Arc::new(MemoryUrlCache::new())
            }
        };

        let resolver_config = ResolverConfig::from_env();
        info!(
            url_lifetime_secs = resolver_config.url_lifetime.as_secs(),
            cache_ttl_secs = resolver_config.cache_ttl.as_secs(),
            "Signed URL settings"
        );

        let state = Self::from_parts(
            config,
            store,
            cache,
            Arc::new(MemoryPodcastRepository::new()),
            resolver_config,
            PaginationConfig::from_env(),
        )
        .context("invalid signed URL configuration")?;
        Ok(state)
    }

    /// Assemble state from already constructed parts.
    pub fn from_parts(
        config: ApiConfig,
        store: Arc<dyn ObjectStore>,
        cache: Arc<dyn UrlCache>,
        repo: Arc<dyn PodcastRepository>,
        resolver_config: ResolverConfig,
        pagination: PaginationConfig,
    ) -> MediaResult<Self> {
        let resolver = MediaResolver::new(Arc::clone(&store), Arc::clone(&cache), resolver_config)?;
        let podcasts = PodcastService::new(repo, resolver, Paginator::new(pagination));

        Ok(Self {
            config,
            store,
            cache,
            podcasts,
        })
    }
}
