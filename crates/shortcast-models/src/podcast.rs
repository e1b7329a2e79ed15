//! Podcast records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::{ObjectKey, SignedUrl};

/// Podcast primary key; also the pagination ordering key.
pub type PodcastId = u64;

/// Owning user identifier.
pub type UserId = u64;

/// A stored podcast. Media is referenced by key only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    pub id: PodcastId,
    pub title: String,
    pub category: String,
    pub audio_key: ObjectKey,
    pub cover_key: ObjectKey,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Podcast {
    /// Keys of all media attached to this podcast.
    pub fn media_keys(&self) -> [&ObjectKey; 2] {
        [&self.audio_key, &self.cover_key]
    }
}

/// Metadata for a podcast that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPodcast {
    pub title: String,
    pub category: String,
    pub user_id: UserId,
}

/// Podcast as returned to API clients, with media projected to signed URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastResponse {
    pub id: PodcastId,
    pub title: String,
    pub category: String,
    pub audio_url: Option<SignedUrl>,
    pub cover_url: Option<SignedUrl>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl PodcastResponse {
    pub fn new(podcast: &Podcast, audio_url: Option<SignedUrl>, cover_url: Option<SignedUrl>) -> Self {
        Self {
            id: podcast.id,
            title: podcast.title.clone(),
            category: podcast.category.clone(),
            audio_url,
            cover_url,
            user_id: podcast.user_id,
            created_at: podcast.created_at,
        }
    }
}
