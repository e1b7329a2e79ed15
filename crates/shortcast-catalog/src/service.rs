//! Podcast service.
//!
//! Pairs record operations with object storage. Writes store objects first
//! and the record second, deleting the new objects if the record write
//! fails. Deletes remove the record first and the objects second, so a
//! record never points at an object that is gone. Read paths project every
//! media key to a signed URL with one batch resolution per response.

use std::sync::Arc;

use shortcast_media::{discard_objects, MediaError, MediaResolver, UploadBatch};
use shortcast_models::{
    DiscoverQuery, MediaFolder, MediaUpload, NewPodcast, ObjectKey, Podcast, PodcastCursor,
    PodcastId, PodcastResponse, SignedUrl, UserId,
};
use shortcast_storage::ObjectStore;
use tracing::{info, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::pagination::Paginator;
use crate::repository::PodcastRepository;

#[derive(Clone)]
pub struct PodcastService {
    repo: Arc<dyn PodcastRepository>,
    resolver: MediaResolver,
    paginator: Paginator,
}

impl PodcastService {
    pub fn new(
        repo: Arc<dyn PodcastRepository>,
        resolver: MediaResolver,
        paginator: Paginator,
    ) -> Self {
        Self {
            repo,
            resolver,
            paginator,
        }
    }

    pub fn resolver(&self) -> &MediaResolver {
        &self.resolver
    }

    fn store(&self) -> &dyn ObjectStore {
        self.resolver.store().as_ref()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get(&self, id: PodcastId) -> CatalogResult<PodcastResponse> {
        let podcast = self.repo.get(id).await?;
        self.respond(&podcast).await
    }

    /// One page of the global feed, ordered by id.
    pub async fn discover(&self, query: &DiscoverQuery) -> CatalogResult<PodcastCursor> {
        let request = self
            .paginator
            .request(query.cursor(), query.direction(), query.limit());
        let page = self.paginator.paginate(self.repo.as_ref(), &request).await?;
        let podcasts = self.project(&page.items).await?;

        Ok(PodcastCursor {
            podcasts,
            next_cursor: page.next_cursor,
            has_next: page.has_next,
            has_previous: page.has_previous,
        })
    }

    pub async fn list_by_user(&self, user_id: UserId) -> CatalogResult<Vec<PodcastResponse>> {
        let podcasts = self.repo.list_by_user(user_id).await?;
        self.project(&podcasts).await
    }

    pub async fn list_by_category(&self, category: &str) -> CatalogResult<Vec<PodcastResponse>> {
        let podcasts = self.repo.list_by_category(category).await?;
        self.project(&podcasts).await
    }

    /// Signed URL for a single object key.
    pub async fn media_url(&self, key: &str) -> CatalogResult<SignedUrl> {
        let key = ObjectKey::from(key);
        Ok(self.resolver.resolve_one(&key).await?)
    }

    /// Raw object content.
    pub async fn file_content(&self, key: &str) -> CatalogResult<Vec<u8>> {
        let key = ObjectKey::parse(key).map_err(|_| MediaError::InvalidKey)?;
        self.store()
            .get(&key)
            .await
            .map_err(|e| MediaError::store("get", &key, e).into())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Store both media files, then the record.
    ///
    /// If the cover fails to store, the audio object is deleted. If the
    /// record fails to persist, both objects are deleted.
    pub async fn upload(
        &self,
        podcast: NewPodcast,
        audio: MediaUpload,
        cover: MediaUpload,
    ) -> CatalogResult<PodcastResponse> {
        validate_details(&podcast.title, &podcast.category)?;
        validate_file("audio", &audio)?;
        validate_file("cover", &cover)?;

        let mut batch = UploadBatch::new(self.store());
        let audio_key = batch.put(&audio, MediaFolder::Audio).await?;
        let cover_key = batch.put(&cover, MediaFolder::Covers).await?;

        let record = match self.repo.insert(podcast, audio_key, cover_key).await {
            Ok(record) => {
                batch.commit();
                record
            }
            Err(e) => {
                warn!(error = %e, "Podcast insert failed, removing uploaded media");
                batch.rollback().await;
                return Err(e);
            }
        };

        info!(
            podcast_id = record.id,
            user_id = record.user_id,
            audio_key = %record.audio_key,
            cover_key = %record.cover_key,
            "Podcast uploaded"
        );
        self.respond(&record).await
    }

    /// Change title and category. Only the owner may do this.
    pub async fn update_details(
        &self,
        id: PodcastId,
        user_id: UserId,
        title: &str,
        category: &str,
    ) -> CatalogResult<PodcastResponse> {
        validate_details(title, category)?;
        self.owned(id, user_id).await?;

        let updated = self.repo.update_details(id, title, category).await?;
        self.respond(&updated).await
    }

    /// Replace the cover image. Only the owner may do this.
    pub async fn update_cover(
        &self,
        id: PodcastId,
        user_id: UserId,
        cover: MediaUpload,
    ) -> CatalogResult<PodcastResponse> {
        validate_file("cover", &cover)?;
        let existing = self.owned(id, user_id).await?;

        let mut batch = UploadBatch::new(self.store());
        let cover_key = batch.put(&cover, MediaFolder::Covers).await?;

        let updated = match self.repo.update_cover(id, cover_key).await {
            Ok(updated) => {
                batch.commit();
                updated
            }
            Err(e) => {
                warn!(podcast_id = id, error = %e, "Cover update failed, removing new cover");
                batch.rollback().await;
                return Err(e);
            }
        };

        self.retire(&[existing.cover_key]).await;
        info!(podcast_id = id, cover_key = %updated.cover_key, "Podcast cover replaced");
        self.respond(&updated).await
    }

    /// Delete the record, then its media. Only the owner may do this.
    pub async fn delete(&self, id: PodcastId, user_id: UserId) -> CatalogResult<()> {
        let podcast = self.owned(id, user_id).await?;
        self.repo.delete(id).await?;

        let Podcast {
            audio_key,
            cover_key,
            ..
        } = podcast;
        self.retire(&[audio_key, cover_key]).await;

        info!(podcast_id = id, user_id, "Podcast deleted");
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn owned(&self, id: PodcastId, user_id: UserId) -> CatalogResult<Podcast> {
        let podcast = self.repo.get(id).await?;
        if podcast.user_id != user_id {
            return Err(CatalogError::forbidden(format!(
                "podcast {} is not owned by user {}",
                id, user_id
            )));
        }
        Ok(podcast)
    }

    /// Delete objects that no record references any more and drop their
    /// cached URLs.
    async fn retire(&self, keys: &[ObjectKey]) {
        discard_objects(self.store(), keys).await;
        for key in keys {
            self.resolver.forget(key).await;
        }
    }

    async fn respond(&self, podcast: &Podcast) -> CatalogResult<PodcastResponse> {
        let mut projected = self.project(std::slice::from_ref(podcast)).await?;
        projected
            .pop()
            .ok_or_else(|| CatalogError::not_found(podcast.id.to_string()))
    }

    /// Project records to responses with one batch URL resolution.
    async fn project(&self, podcasts: &[Podcast]) -> CatalogResult<Vec<PodcastResponse>> {
        let keys: Vec<ObjectKey> = podcasts
            .iter()
            .flat_map(|p| p.media_keys())
            .cloned()
            .collect();
        let urls = self.resolver.resolve_many(&keys).await?;

        Ok(podcasts
            .iter()
            .map(|p| {
                PodcastResponse::new(
                    p,
                    urls.get(&p.audio_key).cloned(),
                    urls.get(&p.cover_key).cloned(),
                )
            })
            .collect())
    }
}

fn validate_details(title: &str, category: &str) -> CatalogResult<()> {
    if title.trim().is_empty() {
        return Err(CatalogError::validation("title is required"));
    }
    if category.trim().is_empty() {
        return Err(CatalogError::validation("category is required"));
    }
    Ok(())
}

fn validate_file(field: &str, upload: &MediaUpload) -> CatalogResult<()> {
    if upload.data.is_empty() {
        return Err(CatalogError::validation(format!("{} file is empty", field)));
    }
    Ok(())
}
