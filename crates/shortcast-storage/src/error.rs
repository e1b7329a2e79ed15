//! Storage error types.
//!
//! `NotFound` is the only variant that says something about the object
//! itself; every other variant is a failure talking to the store.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage misconfigured: {0}")]
    ConfigError(String),

    #[error("No such object: {0}")]
    NotFound(String),

    #[error("Could not store object: {0}")]
    UploadFailed(String),

    #[error("Could not read object: {0}")]
    DownloadFailed(String),

    #[error("Could not remove object: {0}")]
    DeleteFailed(String),

    #[error("Could not sign URL: {0}")]
    PresignFailed(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// Bucket could not be reached or refused the request.
    #[error("Bucket unreachable: {0}")]
    Unreachable(String),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn delete_failed(msg: impl Into<String>) -> Self {
        Self::DeleteFailed(msg.into())
    }

    pub fn presign_failed(msg: impl Into<String>) -> Self {
        Self::PresignFailed(msg.into())
    }

    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    /// An empty key where an object was required.
    pub fn empty_key() -> Self {
        Self::InvalidKey("key must not be empty".to_string())
    }

    /// Whether the referenced object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
