//! Cursor pagination over key-ordered collections.
//!
//! The cursor is an exclusive bound on the ordering key. Paging forward reads
//! keys strictly greater than the cursor in ascending order; paging back
//! reads keys strictly less than the cursor in descending order. One extra
//! row is fetched to detect whether a further page exists.

use async_trait::async_trait;
use shortcast_models::{PageDirection, Podcast, DEFAULT_PAGE_LIMIT};

use crate::error::CatalogResult;

// ============================================================================
// Configuration
// ============================================================================

/// Upper bound on page size when `PAGINATION_MAX_LIMIT` is not set.
pub const DEFAULT_MAX_PAGE_LIMIT: usize = 100;

/// Page size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Used when a request gives no positive limit
    pub default_limit: usize,
    /// Requests above this are capped to it
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: DEFAULT_MAX_PAGE_LIMIT,
        }
    }
}

impl PaginationConfig {
    /// Load from `PAGINATION_DEFAULT_LIMIT` and `PAGINATION_MAX_LIMIT`.
    ///
    /// Zero or unparseable values fall back to the defaults. The default
    /// limit never exceeds the maximum.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |name: &str, fallback: usize| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(fallback)
        };

        let max_limit = read("PAGINATION_MAX_LIMIT", defaults.max_limit);
        let default_limit = read("PAGINATION_DEFAULT_LIMIT", defaults.default_limit).min(max_limit);

        Self {
            default_limit,
            max_limit,
        }
    }

    /// Normalize a requested limit: non-positive means default, large is capped.
    pub fn normalize_limit(&self, limit: i64) -> usize {
        if limit <= 0 {
            return self.default_limit;
        }
        usize::try_from(limit)
            .unwrap_or(usize::MAX)
            .min(self.max_limit)
    }
}

// ============================================================================
// Query
// ============================================================================

/// Anything that can be paginated by a numeric ordering key.
pub trait Keyed {
    fn order_key(&self) -> u64;
}

impl Keyed for Podcast {
    fn order_key(&self) -> u64 {
        self.id
    }
}

/// Exclusive bound on the ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBound {
    /// Keys strictly greater than this one
    After(u64),
    /// Keys strictly less than this one
    Before(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A normalized pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Option<u64>,
    pub direction: PageDirection,
    pub limit: usize,
}

impl PageRequest {
    /// Window the source must read to answer this request.
    pub fn query(&self) -> PageQuery {
        let (bound, order) = match self.direction {
            PageDirection::Next => (self.cursor.map(KeyBound::After), SortOrder::Ascending),
            PageDirection::Prev => (self.cursor.map(KeyBound::Before), SortOrder::Descending),
        };

        PageQuery {
            bound,
            order,
            fetch_limit: self.limit.saturating_add(1),
        }
    }
}

/// What a [`PageSource`] is asked to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub bound: Option<KeyBound>,
    pub order: SortOrder,
    /// Page limit plus one
    pub fetch_limit: usize,
}

/// A collection that can read one page window.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Return at most `query.fetch_limit` items admitted by the bound, in
    /// the requested order.
    async fn fetch_window(&self, query: &PageQuery) -> CatalogResult<Vec<T>>;
}

// ============================================================================
// Paginator
// ============================================================================

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present only when `has_next`
    pub next_cursor: Option<u64>,
    pub has_next: bool,
    /// True whenever the request carried a cursor
    pub has_previous: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Build a normalized request. Never fails.
    pub fn request(&self, cursor: Option<u64>, direction: PageDirection, limit: i64) -> PageRequest {
        PageRequest {
            cursor,
            direction,
            limit: self.config.normalize_limit(limit),
        }
    }

    /// Turn the fetched window (up to limit + 1 rows) into a page.
    ///
    /// `has_previous` reflects only whether a cursor was given, not whether
    /// earlier rows actually exist.
    pub fn assemble<T: Keyed>(&self, request: &PageRequest, mut rows: Vec<T>) -> Page<T> {
        let has_next = rows.len() > request.limit;
        let mut next_cursor = None;
        if has_next {
            rows.truncate(request.limit);
            next_cursor = rows.last().map(|last| last.order_key().saturating_add(1));
        }

        Page {
            items: rows,
            next_cursor,
            has_next,
            has_previous: request.cursor.is_some(),
        }
    }

    /// Read one page from `source`.
    pub async fn paginate<T, S>(&self, source: &S, request: &PageRequest) -> CatalogResult<Page<T>>
    where
        T: Keyed + Send,
        S: PageSource<T> + ?Sized,
    {
        let query = request.query();
        let rows = source.fetch_window(&query).await?;
        Ok(self.assemble(request, rows))
    }
}
