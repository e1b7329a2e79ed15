//! API configuration.

/// Where media objects live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Cloudflare R2 through the S3 API
    #[default]
    R2,
    /// Process memory, for local development
    Memory,
}

impl StorageBackend {
    /// Parse from string, returning `R2` for anything unrecognised.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Self::Memory,
            _ => Self::R2,
        }
    }
}

/// Where signed URLs are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

impl CacheBackend {
    /// Parse from string, returning `Redis` for anything unrecognised.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Self::Memory,
            _ => Self::Redis,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    pub storage_backend: StorageBackend,
    pub cache_backend: CacheBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            storage_backend: StorageBackend::default(),
            cache_backend: CacheBackend::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            storage_backend: std::env::var("STORAGE_BACKEND")
                .map(|s| StorageBackend::from_str_or_default(&s))
                .unwrap_or_default(),
            cache_backend: std::env::var("CACHE_BACKEND")
                .map(|s| CacheBackend::from_str_or_default(&s))
                .unwrap_or_default(),
        }
    }

    /// Configuration with in-process storage and cache.
    pub fn in_memory() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            cache_backend: CacheBackend::Memory,
            ..Self::default()
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!(StorageBackend::from_str_or_default("memory"), StorageBackend::Memory);
        assert_eq!(StorageBackend::from_str_or_default(" R2 "), StorageBackend::R2);
        assert_eq!(StorageBackend::from_str_or_default("s3"), StorageBackend::R2);
        assert_eq!(CacheBackend::from_str_or_default("MEMORY"), CacheBackend::Memory);
        assert_eq!(CacheBackend::from_str_or_default(""), CacheBackend::Redis);
    }

    #[test]
    fn test_in_memory_config() {
        let config = ApiConfig::in_memory();
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.cache_backend, CacheBackend::Memory);
        assert!(!config.is_production());
    }
}
