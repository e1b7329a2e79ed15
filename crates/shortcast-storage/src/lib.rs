//! Object storage for podcast media.
//!
//! This crate provides:
//! - The [`ObjectStore`] boundary (put/delete/get/sign)
//! - A Cloudflare R2 implementation over the S3 API
//! - An in-process store for local development and tests
//! - Object key generation

pub mod client;
pub mod error;
pub mod keys;
pub mod memory;
pub mod store;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use keys::generate_object_key;
pub use memory::MemoryObjectStore;
pub use store::{ObjectStore, MAX_PRESIGN_TTL};
