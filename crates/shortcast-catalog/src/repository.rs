//! Podcast persistence boundary.
//!
//! Records reference media by object key only. The service layer owns the
//! ordering between record writes and object writes.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use chrono::Utc;
use shortcast_models::{NewPodcast, ObjectKey, Podcast, PodcastId, UserId};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::pagination::{KeyBound, PageQuery, PageSource, SortOrder};

/// Podcast record store. Implementations also serve discover pages.
#[async_trait]
pub trait PodcastRepository: PageSource<Podcast> {
    /// Persist a new podcast and assign its id.
    async fn insert(
        &self,
        podcast: NewPodcast,
        audio_key: ObjectKey,
        cover_key: ObjectKey,
    ) -> CatalogResult<Podcast>;

    /// Fetch by id. Missing records are `NotFound`.
    async fn get(&self, id: PodcastId) -> CatalogResult<Podcast>;

    /// All podcasts owned by a user, ascending by id.
    async fn list_by_user(&self, user_id: UserId) -> CatalogResult<Vec<Podcast>>;

    /// All podcasts in a category, ascending by id.
    async fn list_by_category(&self, category: &str) -> CatalogResult<Vec<Podcast>>;

    /// Replace title and category.
    async fn update_details(
        &self,
        id: PodcastId,
        title: &str,
        category: &str,
    ) -> CatalogResult<Podcast>;

    /// Point the record at a new cover object.
    async fn update_cover(&self, id: PodcastId, cover_key: ObjectKey) -> CatalogResult<Podcast>;

    /// Remove a record. Missing records are `NotFound`.
    async fn delete(&self, id: PodcastId) -> CatalogResult<()>;
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<PodcastId, Podcast>,
    last_id: PodcastId,
    fail_writes: bool,
}

impl Table {
    fn check_writable(&self) -> CatalogResult<()> {
        if self.fail_writes {
            return Err(CatalogError::repository("injected write failure"));
        }
        Ok(())
    }

    fn row_mut(&mut self, id: PodcastId) -> CatalogResult<&mut Podcast> {
        self.rows
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found(id.to_string()))
    }
}

/// In-process podcast repository, ordered by id.
#[derive(Debug, Default)]
pub struct MemoryPodcastRepository {
    table: RwLock<Table>,
}

impl MemoryPodcastRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with a repository error.
    pub async fn fail_writes(&self, fail: bool) {
        self.table.write().await.fail_writes = fail;
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }

    fn filtered(table: &Table, pred: impl Fn(&Podcast) -> bool) -> Vec<Podcast> {
        table.rows.values().filter(|p| pred(p)).cloned().collect()
    }
}

#[async_trait]
impl PageSource<Podcast> for MemoryPodcastRepository {
    async fn fetch_window(&self, query: &PageQuery) -> CatalogResult<Vec<Podcast>> {
        let table = self.table.read().await;
        let range = match query.bound {
            None => table.rows.range::<PodcastId, _>(..),
            Some(KeyBound::After(cursor)) => {
                table.rows.range((Bound::Excluded(cursor), Bound::Unbounded))
            }
            Some(KeyBound::Before(cursor)) => table.rows.range(..cursor),
        };

        let rows: Vec<Podcast> = match query.order {
            SortOrder::Ascending => range.take(query.fetch_limit).map(|(_, p)| p.clone()).collect(),
            SortOrder::Descending => range
                .rev()
                .take(query.fetch_limit)
                .map(|(_, p)| p.clone())
                .collect(),
        };
        Ok(rows)
    }
}

#[async_trait]
impl PodcastRepository for MemoryPodcastRepository {
    async fn insert(
        &self,
        podcast: NewPodcast,
        audio_key: ObjectKey,
        cover_key: ObjectKey,
    ) -> CatalogResult<Podcast> {
        let mut table = self.table.write().await;
        table.check_writable()?;

        table.last_id += 1;
        let now = Utc::now();
        let record = Podcast {
            id: table.last_id,
            title: podcast.title,
            category: podcast.category,
            audio_key,
            cover_key,
            user_id: podcast.user_id,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(record.id, record.clone());
        debug!(podcast_id = record.id, "Inserted podcast");
        Ok(record)
    }

    async fn get(&self, id: PodcastId) -> CatalogResult<Podcast> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(id.to_string()))
    }

    async fn list_by_user(&self, user_id: UserId) -> CatalogResult<Vec<Podcast>> {
        let table = self.table.read().await;
        Ok(Self::filtered(&table, |p| p.user_id == user_id))
    }

    async fn list_by_category(&self, category: &str) -> CatalogResult<Vec<Podcast>> {
        let table = self.table.read().await;
        Ok(Self::filtered(&table, |p| p.category == category))
    }

    async fn update_details(
        &self,
        id: PodcastId,
        title: &str,
        category: &str,
    ) -> CatalogResult<Podcast> {
        let mut table = self.table.write().await;
        table.check_writable()?;

        let row = table.row_mut(id)?;
        row.title = title.to_string();
        row.category = category.to_string();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn update_cover(&self, id: PodcastId, cover_key: ObjectKey) -> CatalogResult<Podcast> {
        let mut table = self.table.write().await;
        table.check_writable()?;

        let row = table.row_mut(id)?;
        row.cover_key = cover_key;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: PodcastId) -> CatalogResult<()> {
        let mut table = self.table.write().await;
        table.check_writable()?;

        table
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::not_found(id.to_string()))
    }
}
