//! Object store boundary.

use std::time::Duration;

use async_trait::async_trait;
use shortcast_models::{MediaFolder, MediaUpload, ObjectKey, SignedUrl};

use crate::error::StorageResult;

/// Longest lifetime an S3 presigned URL may carry (7 days).
pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Authoritative blob storage and URL signing.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a blob under a freshly generated key inside `folder`.
    async fn put(&self, upload: &MediaUpload, folder: MediaFolder) -> StorageResult<ObjectKey>;

    /// Delete an object.
    ///
    /// Fails with `NotFound` when a metadata lookup shows the key does not exist.
    async fn delete(&self, key: &ObjectKey) -> StorageResult<()>;

    /// Fetch the full object content.
    async fn get(&self, key: &ObjectKey) -> StorageResult<Vec<u8>>;

    /// Mint a signed GET URL valid for `ttl`. Existence is not checked.
    async fn sign(&self, key: &ObjectKey, ttl: Duration) -> StorageResult<SignedUrl>;

    /// Check whether an object exists.
    async fn exists(&self, key: &ObjectKey) -> StorageResult<bool>;

    /// Check that the bucket is reachable with the configured credentials.
    async fn check_connectivity(&self) -> StorageResult<()>;
}
