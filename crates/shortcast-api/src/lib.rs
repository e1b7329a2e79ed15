//! Axum HTTP API server.
//!
//! This crate provides:
//! - Read endpoints for the podcast catalog with signed media URLs
//! - Owner-only upload, update and delete endpoints
//! - Object content and signed URL lookups by key
//! - Liveness and readiness probes
//! - Prometheus metrics

pub mod caller;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use caller::{Caller, USER_ID_HEADER};
pub use config::{ApiConfig, CacheBackend, StorageBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
