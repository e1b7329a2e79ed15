//! Podcast catalog.
//!
//! This crate provides:
//! - Cursor pagination over key-ordered collections
//! - The podcast repository boundary and an in-memory repository
//! - `PodcastService`, which pairs catalog reads and writes with media
//!   resolution and compensating object deletes

pub mod error;
pub mod pagination;
pub mod repository;
pub mod service;

pub use error::{CatalogError, CatalogResult};
pub use pagination::{
    KeyBound, Keyed, Page, PageQuery, PageRequest, PageSource, PaginationConfig, Paginator,
    SortOrder,
};
pub use repository::{MemoryPodcastRepository, PodcastRepository};
pub use service::PodcastService;
