//! Resolver configuration.

use std::time::Duration;

use shortcast_storage::MAX_PRESIGN_TTL;

use crate::error::{MediaError, MediaResult};

/// Default lifetime of signed URLs (24 hours).
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default cache lifetime, one hour short of the URL lifetime to absorb clock
/// skew and signing latency.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(23 * 60 * 60);

/// Signed URL lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Lifetime embedded in each signed URL
    pub url_lifetime: Duration,
    /// How long a signed URL stays cached; never longer than `url_lifetime`
    pub cache_ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            url_lifetime: DEFAULT_SIGNED_URL_TTL,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl ResolverConfig {
    /// Create config from environment variables.
    ///
    /// Without `SIGNED_URL_CACHE_TTL_SECS` the cache lifetime is the URL
    /// lifetime less a 1/24 margin (23h against the default 24h).
    pub fn from_env() -> Self {
        let secs = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .map(|ttl| ttl.min(MAX_PRESIGN_TTL))
        };

        let url_lifetime = secs("SIGNED_URL_TTL_SECS").unwrap_or(DEFAULT_SIGNED_URL_TTL);
        Self {
            url_lifetime,
            cache_ttl: secs("SIGNED_URL_CACHE_TTL_SECS")
                .unwrap_or_else(|| margin_below(url_lifetime)),
        }
    }

    /// Check that a cached URL can never outlive its signature.
    pub fn validate(&self) -> MediaResult<()> {
        if self.url_lifetime.is_zero() || self.cache_ttl.is_zero() {
            return Err(MediaError::invalid_config("lifetimes must be non-zero"));
        }
        if self.url_lifetime > MAX_PRESIGN_TTL {
            return Err(MediaError::invalid_config(format!(
                "url lifetime {}s exceeds presign maximum {}s",
                self.url_lifetime.as_secs(),
                MAX_PRESIGN_TTL.as_secs()
            )));
        }
        if self.cache_ttl > self.url_lifetime {
            return Err(MediaError::invalid_config(format!(
                "cache ttl {}s exceeds signed url lifetime {}s",
                self.cache_ttl.as_secs(),
                self.url_lifetime.as_secs()
            )));
        }
        Ok(())
    }
}

fn margin_below(url_lifetime: Duration) -> Duration {
    url_lifetime - url_lifetime / 24
}
