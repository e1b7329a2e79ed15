//! Shared data models for the Shortcast backend.
//!
//! This crate provides Serde-serializable types for:
//! - Object storage references (keys, signed URLs, media folders)
//! - Podcast records and their API projections
//! - Cursor pagination requests and pages

pub mod media;
pub mod pagination;
pub mod podcast;

// Re-export common types
pub use media::{InvalidKeyError, MediaFolder, MediaUpload, ObjectKey, SignedUrl};
pub use pagination::{DiscoverQuery, PageDirection, PodcastCursor, DEFAULT_PAGE_LIMIT};
pub use podcast::{NewPodcast, Podcast, PodcastId, PodcastResponse, UserId};
