//! Multi-object uploads with compensating deletes.
//!
//! Object storage is not transactional with the caller's records, so a
//! multi-file operation that fails part way must delete what it already
//! stored. Cleanup failures are logged and swallowed so the original error
//! reaches the caller.

use futures::future::join_all;
use shortcast_models::{MediaFolder, MediaUpload, ObjectKey};
use shortcast_storage::ObjectStore;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Objects stored for one logical operation.
///
/// A failed [`put`](Self::put) rolls back the earlier puts by itself. Once
/// all puts succeed the caller must either [`commit`](Self::commit) or
/// [`rollback`](Self::rollback).
pub struct UploadBatch<'a> {
    store: &'a dyn ObjectStore,
    stored: Vec<ObjectKey>,
}

impl<'a> UploadBatch<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            stored: Vec::new(),
        }
    }

    /// Store one file. On failure every object stored so far is deleted.
    pub async fn put(&mut self, upload: &MediaUpload, folder: MediaFolder) -> MediaResult<ObjectKey> {
        match self.store.put(upload, folder).await {
            Ok(key) => {
                self.stored.push(key.clone());
                Ok(key)
            }
            Err(e) => {
                warn!(
                    folder = %folder,
                    filename = %upload.filename,
                    stored = self.stored.len(),
                    error = %e,
                    "Upload failed, removing objects already stored"
                );
                self.rollback().await;
                Err(MediaError::upload(folder, upload.filename.as_str(), e))
            }
        }
    }

    /// Keys stored so far.
    pub fn keys(&self) -> &[ObjectKey] {
        &self.stored
    }

    /// Keep every stored object.
    pub fn commit(self) -> Vec<ObjectKey> {
        self.stored
    }

    /// Delete every stored object, best-effort.
    pub async fn rollback(&mut self) {
        let keys = std::mem::take(&mut self.stored);
        if !keys.is_empty() {
            discard_objects(self.store, &keys).await;
        }
    }
}

/// Delete objects concurrently, ignoring failures. Empty keys are skipped.
///
/// Returns the number of objects actually deleted.
pub async fn discard_objects(store: &dyn ObjectStore, keys: &[ObjectKey]) -> usize {
    let results = join_all(
        keys.iter()
            .filter(|k| !k.is_empty())
            .map(|key| async move { (key, store.delete(key).await) }),
    )
    .await;

    let mut deleted = 0;
    for (key, result) in results {
        match result {
            Ok(()) => {
                deleted += 1;
                info!(key = %key, "Discarded object");
            }
            Err(e) if e.is_not_found() => {
                debug!(key = %key, "Object already gone");
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to discard object");
            }
        }
    }
    deleted
}
