//! Object storage references.
//!
//! Domain records only ever hold an [`ObjectKey`]. A [`SignedUrl`] is derived
//! from a key at the response boundary and is never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a key is required but none was given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("object key must not be empty")]
pub struct InvalidKeyError;

/// Identifier of a stored blob, shaped `<folder>/<timestamp>_<name>`.
///
/// An empty key is representable because records use it to mean
/// "no object attached".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a key, rejecting the empty string.
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidKeyError> {
        let s = s.into();
        if s.is_empty() {
            return Err(InvalidKeyError);
        }
        Ok(Self(s))
    }

    /// Create from an existing string without validation.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key refers to no object.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Folder component (everything before the first `/`), if any.
    pub fn folder(&self) -> Option<&str> {
        self.0.split_once('/').map(|(folder, _)| folder)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ObjectKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ObjectKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Time-limited URL granting read access to one object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedUrl(String);

impl SignedUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SignedUrl {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Top-level folders media is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFolder {
    Audio,
    Covers,
}

impl MediaFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFolder::Audio => "audio",
            MediaFolder::Covers => "covers",
        }
    }
}

impl fmt::Display for MediaFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file handed over by the upload layer.
#[derive(Clone)]
pub struct MediaUpload {
    /// Client-supplied filename
    pub filename: String,
    /// MIME type
    pub content_type: String,
    /// File contents
    pub data: Vec<u8>,
}

impl MediaUpload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

impl fmt::Debug for MediaUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}
