//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    delete_podcast, discover_podcasts, get_media_url, get_podcast, get_podcast_file, health,
    list_category_podcasts, list_user_podcasts, ready, update_podcast, update_podcast_cover,
    upload_podcast,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let podcast_routes = Router::new()
        .route("/podcasts", post(upload_podcast))
        .route("/podcasts/discover", get(discover_podcasts))
        .route("/podcasts/category/:category", get(list_category_podcasts))
        // Object content and signed URLs by key
        .route("/podcasts/file/*key", get(get_podcast_file))
        .route("/podcasts/url/*key", get(get_media_url))
        .route(
            "/podcasts/:id",
            get(get_podcast).put(update_podcast).delete(delete_podcast),
        )
        .route("/podcasts/:id/cover", put(update_podcast_cover))
        .route("/users/:user_id/podcasts", get(list_user_podcasts));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", podcast_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Multipart uploads are bounded by the configured limit, not axum's 2MB default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
