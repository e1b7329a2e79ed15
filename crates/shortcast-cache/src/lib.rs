//! Signed URL cache.
//!
//! This crate provides:
//! - The [`UrlCache`] boundary (single and batched get/set with TTL)
//! - A Redis implementation namespaced under `signed_url:`
//! - An in-process implementation with read-time expiry

pub mod cache;
pub mod error;
pub mod memory;
pub mod redis_cache;

pub use cache::{CacheConfig, UrlCache, DEFAULT_KEY_PREFIX};
pub use error::{CacheError, CacheResult};
pub use memory::MemoryUrlCache;
pub use redis_cache::RedisUrlCache;
