//! In-process object store.
//!
//! Backs local development (`STORAGE_BACKEND=memory`) and tests. Signed URLs
//! are opaque `memory://` URLs carrying the expiry; nothing serves them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use shortcast_models::{MediaFolder, MediaUpload, ObjectKey, SignedUrl};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::keys::generate_object_key;
use crate::store::{ObjectStore, MAX_PRESIGN_TTL};

/// Failure switches for exercising error paths.
#[derive(Debug, Default)]
struct Faults {
    put_folders: HashSet<MediaFolder>,
    sign: bool,
    delete: bool,
}

/// Object store holding everything in memory.
#[derive(Debug)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<HashMap<ObjectKey, Vec<u8>>>,
    faults: RwLock<Faults>,
    sign_calls: AtomicUsize,
    signed: RwLock<HashMap<ObjectKey, usize>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
            faults: RwLock::new(Faults::default()),
            sign_calls: AtomicUsize::new(0),
            signed: RwLock::new(HashMap::new()),
        }
    }

    /// Store an object under an explicit key.
    pub async fn insert(&self, key: impl Into<ObjectKey>, data: Vec<u8>) {
        self.objects.write().await.insert(key.into(), data);
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<ObjectKey> {
        let mut keys: Vec<_> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Total number of `sign` calls so far.
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    /// Number of `sign` calls for one key.
    pub async fn sign_calls_for(&self, key: &ObjectKey) -> usize {
        self.signed.read().await.get(key).copied().unwrap_or(0)
    }

    /// Make every `put` into `folder` fail.
    pub async fn fail_puts_to(&self, folder: MediaFolder) {
        self.faults.write().await.put_folders.insert(folder);
    }

    /// Make every `sign` fail.
    pub async fn fail_signing(&self, fail: bool) {
        self.faults.write().await.sign = fail;
    }

    /// Make every `delete` fail after the existence check.
    pub async fn fail_deletes(&self, fail: bool) {
        self.faults.write().await.delete = fail;
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, upload: &MediaUpload, folder: MediaFolder) -> StorageResult<ObjectKey> {
        if self.faults.read().await.put_folders.contains(&folder) {
            return Err(StorageError::upload_failed(format!(
                "injected failure for folder {}",
                folder
            )));
        }

        let key = generate_object_key(folder, &upload.filename, Utc::now());
        self.objects
            .write()
            .await
            .insert(key.clone(), upload.data.clone());
        debug!(key = %key, "Stored object in memory");
        Ok(key)
    }

    async fn delete(&self, key: &ObjectKey) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::empty_key());
        }
        if !self.exists(key).await? {
            return Err(StorageError::not_found(key.as_str()));
        }
        if self.faults.read().await.delete {
            return Err(StorageError::delete_failed("injected failure"));
        }
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> StorageResult<Vec<u8>> {
        if key.is_empty() {
            return Err(StorageError::empty_key());
        }
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key.as_str()))
    }

    async fn sign(&self, key: &ObjectKey, ttl: Duration) -> StorageResult<SignedUrl> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        *self.signed.write().await.entry(key.clone()).or_insert(0) += 1;

        if self.faults.read().await.sign {
            return Err(StorageError::presign_failed("injected failure"));
        }
        if ttl > MAX_PRESIGN_TTL {
            return Err(StorageError::presign_failed("expiry exceeds maximum"));
        }

        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(SignedUrl::new(format!(
            "memory://{}/{}?expires={}",
            self.bucket, key, expires
        )))
    }

    async fn exists(&self, key: &ObjectKey) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}
