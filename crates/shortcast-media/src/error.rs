//! Media error types.

use shortcast_models::{MediaFolder, ObjectKey};
use shortcast_storage::StorageError;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid key: object key must not be empty")]
    InvalidKey,

    #[error("Invalid resolver configuration: {0}")]
    InvalidConfig(String),

    /// Object store failure, with the operation and key it happened on.
    #[error("{op} failed for '{key}': {source}")]
    Store {
        op: &'static str,
        key: String,
        #[source]
        source: StorageError,
    },

    /// A new object could not be stored. No key exists yet, so the target
    /// folder and the client filename are kept instead.
    #[error("upload of '{filename}' to {folder} failed: {source}")]
    Upload {
        folder: MediaFolder,
        filename: String,
        #[source]
        source: StorageError,
    },
}

impl MediaError {
    pub fn store(op: &'static str, key: &ObjectKey, source: StorageError) -> Self {
        Self::Store {
            op,
            key: key.to_string(),
            source,
        }
    }

    pub fn upload(folder: MediaFolder, filename: impl Into<String>, source: StorageError) -> Self {
        Self::Upload {
            folder,
            filename: filename.into(),
            source,
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the underlying object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MediaError::Store { source, .. } if source.is_not_found())
    }
}
