//! Media reference resolution.
//!
//! This crate provides:
//! - [`MediaResolver`]: cache-aside resolution of object keys to signed URLs,
//!   for single keys and for whole listing pages
//! - [`UploadBatch`]: multi-object uploads that clean up after partial failure

pub mod config;
pub mod error;
pub mod metrics;
pub mod resolver;
pub mod upload;

pub use config::{ResolverConfig, DEFAULT_CACHE_TTL, DEFAULT_SIGNED_URL_TTL};
pub use error::{MediaError, MediaResult};
pub use resolver::MediaResolver;
pub use upload::{discard_objects, UploadBatch};
