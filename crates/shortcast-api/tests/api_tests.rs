//! API integration tests over in-memory backends.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use shortcast_api::{create_router, ApiConfig, AppState};
use shortcast_cache::MemoryUrlCache;
use shortcast_catalog::{MemoryPodcastRepository, PaginationConfig, PodcastRepository};
use shortcast_media::ResolverConfig;
use shortcast_models::{MediaFolder, NewPodcast, ObjectKey};
use shortcast_storage::MemoryObjectStore;

struct TestApp {
    router: Router,
    store: Arc<MemoryObjectStore>,
}

async fn create_test_app(podcasts: u64) -> TestApp {
    let store = Arc::new(MemoryObjectStore::new("test-bucket"));
    let repo = Arc::new(MemoryPodcastRepository::new());

    for i in 1..=podcasts {
        let audio_key = ObjectKey::from(format!("audio/{}_ab12cd34_show.mp3", i));
        let cover_key = ObjectKey::from(format!("covers/{}_ab12cd34_art.png", i));
        store.insert(audio_key.clone(), b"ID3".to_vec()).await;
        store.insert(cover_key.clone(), b"\x89PNG".to_vec()).await;

        let category = if i % 2 == 0 { "music" } else { "tech" };
        repo.insert(
            NewPodcast {
                title: format!("Episode {}", i),
                category: category.to_string(),
                user_id: if i <= 2 { 1 } else { 2 },
            },
            audio_key,
            cover_key,
        )
        .await
        .unwrap();
    }

    let state = AppState::from_parts(
        ApiConfig::in_memory(),
        store.clone(),
        Arc::new(MemoryUrlCache::new()),
        repo,
        ResolverConfig::default(),
        PaginationConfig::default(),
    )
    .unwrap();

    TestApp {
        router: create_router(state, None),
        store,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

const BOUNDARY: &str = "shortcast-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

fn audio_part() -> Part<'static> {
    Part::File {
        name: "audio",
        filename: "show.mp3",
        content_type: "audio/mpeg",
        data: b"ID3new",
    }
}

fn cover_part() -> Part<'static> {
    Part::File {
        name: "cover",
        filename: "art.png",
        content_type: "image/png",
        data: b"\x89PNGnew",
    }
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(method: Method, uri: &str, user: Option<u64>, parts: &[Part]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(user) = user {
        builder = builder.header("X-User-ID", user.to_string());
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

fn json_request(method: Method, uri: &str, user: u64, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-User-ID", user.to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn ids(podcasts: &Value) -> Vec<u64> {
    podcasts
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(0).await;

    let (status, body) = get_json(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = create_test_app(0).await;

    let (status, body) = get_json(&app.router, "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["cache"]["status"], "ok");
    assert_eq!(body["checks"]["storage"]["status"], "ok");
}

#[tokio::test]
async fn test_metrics_disabled_is_not_found() {
    let app = create_test_app(0).await;

    let (status, _, _) = get(&app.router, "/metrics").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app(0).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Request-ID", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["X-Request-ID"], "req-123");
}

#[tokio::test]
async fn test_discover_pages_forward_and_back() {
    let app = create_test_app(5).await;

    let (status, first) = get_json(&app.router, "/api/podcasts/discover?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&first["podcasts"]), vec![1, 2]);
    assert_eq!(first["has_next"], true);
    assert_eq!(first["next_cursor"], 3);
    assert_eq!(first["has_previous"], false);
    assert!(first["podcasts"][0]["audio_url"]
        .as_str()
        .unwrap()
        .starts_with("memory://test-bucket/audio/1_ab12cd34_show.mp3?expires="));

    let (_, last) = get_json(&app.router, "/api/podcasts/discover?cursor=3&direction=next&limit=2").await;
    assert_eq!(ids(&last["podcasts"]), vec![4, 5]);
    assert_eq!(last["has_next"], false);
    assert!(last.get("next_cursor").is_none());
    assert_eq!(last["has_previous"], true);

    let (_, back) = get_json(&app.router, "/api/podcasts/discover?cursor=3&direction=prev&limit=10").await;
    assert_eq!(ids(&back["podcasts"]), vec![2, 1]);
}

#[tokio::test]
async fn test_discover_malformed_params_use_defaults() {
    let app = create_test_app(12).await;

    let (status, page) =
        get_json(&app.router, "/api/podcasts/discover?cursor=abc&direction=up&limit=-4").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&page["podcasts"]), (1..=10).collect::<Vec<_>>());
    assert_eq!(page["has_next"], true);
    assert_eq!(page["has_previous"], false);
}

#[tokio::test]
async fn test_listing_signs_each_key_once() {
    let app = create_test_app(4).await;

    get_json(&app.router, "/api/podcasts/discover?limit=4").await;
    assert_eq!(app.store.sign_calls(), 8);

    // every key on these pages is already cached
    get_json(&app.router, "/api/users/1/podcasts").await;
    get_json(&app.router, "/api/podcasts/category/tech").await;
    get_json(&app.router, "/api/podcasts/3").await;
    assert_eq!(app.store.sign_calls(), 8);
}

#[tokio::test]
async fn test_get_podcast() {
    let app = create_test_app(2).await;

    let (status, podcast) = get_json(&app.router, "/api/podcasts/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(podcast["title"], "Episode 2");
    assert!(podcast["cover_url"].as_str().unwrap().contains("covers/2_ab12cd34_art.png"));

    let (status, _) = get_json(&app.router, "/api/podcasts/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(&app.router, "/api/podcasts/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_and_category_listings() {
    let app = create_test_app(4).await;

    let (status, user) = get_json(&app.router, "/api/users/1/podcasts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&user["podcasts"]), vec![1, 2]);

    let (_, category) = get_json(&app.router, "/api/podcasts/category/music").await;
    assert_eq!(ids(&category["podcasts"]), vec![2, 4]);

    let (_, empty) = get_json(&app.router, "/api/podcasts/category/comedy").await;
    assert!(empty["podcasts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_signing_outage_is_object_unavailable() {
    let app = create_test_app(1).await;
    app.store.fail_signing(true).await;

    let (status, body) = get_json(&app.router, "/api/podcasts/1").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["detail"], "object unavailable");
    assert_eq!(body["code"], "object_unavailable");
}

#[tokio::test]
async fn test_file_content() {
    let app = create_test_app(1).await;

    let (status, headers, body) = get(&app.router, "/api/podcasts/file/audio/1_ab12cd34_show.mp3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "audio/mpeg");
    assert_eq!(body, b"ID3".to_vec());

    let (status, _, _) = get(&app.router, "/api/podcasts/file/audio/missing.mp3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&app.router, "/api/podcasts/file/audio/../secret").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_media_url_lookup() {
    let app = create_test_app(1).await;

    let (status, first) = get_json(&app.router, "/api/podcasts/url/covers/1_ab12cd34_art.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["key"], "covers/1_ab12cd34_art.png");
    assert_eq!(first["expires_in_secs"], 86_400);

    let (_, second) = get_json(&app.router, "/api/podcasts/url/covers/1_ab12cd34_art.png").await;
    assert_eq!(first["url"], second["url"]);
    assert_eq!(app.store.sign_calls(), 1);
}

#[tokio::test]
async fn test_upload_podcast() {
    let app = create_test_app(0).await;
    let request = multipart_request(
        Method::POST,
        "/api/podcasts",
        Some(7),
        &[
            Part::Text("title", "Launch"),
            Part::Text("category", "tech"),
            audio_part(),
            cover_part(),
        ],
    );

    let (status, created) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Launch");
    assert_eq!(created["user_id"], 7);
    assert!(created["audio_url"].as_str().unwrap().contains("/audio/"));
    assert!(created["cover_url"].as_str().unwrap().contains("/covers/"));
    assert_eq!(app.store.len().await, 2);

    let id = created["id"].as_u64().unwrap();
    let (status, fetched) = get_json(&app.router, &format!("/api/podcasts/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Launch");
}

#[tokio::test]
async fn test_upload_requires_caller() {
    let app = create_test_app(0).await;
    let request = multipart_request(
        Method::POST,
        "/api/podcasts",
        None,
        &[
            Part::Text("title", "Launch"),
            Part::Text("category", "tech"),
            audio_part(),
            cover_part(),
        ],
    );

    let (status, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_upload_rejects_missing_fields() {
    let app = create_test_app(0).await;

    let no_cover = multipart_request(
        Method::POST,
        "/api/podcasts",
        Some(7),
        &[Part::Text("title", "Launch"), Part::Text("category", "tech"), audio_part()],
    );
    let (status, _) = send(&app.router, no_cover).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let no_title = multipart_request(
        Method::POST,
        "/api/podcasts",
        Some(7),
        &[Part::Text("category", "tech"), audio_part(), cover_part()],
    );
    let (status, _) = send(&app.router, no_title).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_upload_cover_failure_removes_audio() {
    let app = create_test_app(0).await;
    app.store.fail_puts_to(MediaFolder::Covers).await;
    let request = multipart_request(
        Method::POST,
        "/api/podcasts",
        Some(7),
        &[
            Part::Text("title", "Launch"),
            Part::Text("category", "tech"),
            audio_part(),
            cover_part(),
        ],
    );

    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "object_unavailable");
    assert!(app.store.is_empty().await);

    let (_, feed) = get_json(&app.router, "/api/podcasts/discover").await;
    assert!(feed["podcasts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_podcast_details() {
    let app = create_test_app(2).await;
    let change = serde_json::json!({ "title": "Renamed", "category": "news" });

    let (status, _) = send(
        &app.router,
        json_request(Method::PUT, "/api/podcasts/1", 2, change.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app.router,
        json_request(Method::PUT, "/api/podcasts/1", 1, change),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["category"], "news");

    let blank = serde_json::json!({ "title": " ", "category": "news" });
    let (status, _) = send(
        &app.router,
        json_request(Method::PUT, "/api/podcasts/1", 1, blank),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_podcast_cover_retires_old_cover() {
    let app = create_test_app(1).await;
    let old_cover = ObjectKey::from("covers/1_ab12cd34_art.png");
    let (_, before) = get_json(&app.router, "/api/podcasts/1").await;

    let request = multipart_request(Method::PUT, "/api/podcasts/1/cover", Some(1), &[cover_part()]);
    let (status, updated) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(updated["cover_url"], before["cover_url"]);
    assert_eq!(updated["audio_url"], before["audio_url"]);

    let keys = app.store.keys().await;
    assert!(!keys.contains(&old_cover));
    assert_eq!(keys.len(), 2);
}

#[tokio::test]
async fn test_delete_podcast() {
    let app = create_test_app(1).await;
    let delete = |user: u64| {
        Request::builder()
            .method(Method::DELETE)
            .uri("/api/podcasts/1")
            .header("X-User-ID", user.to_string())
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&app.router, delete(2)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.len().await, 2);

    let (status, _) = send(&app.router, delete(1)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.store.is_empty().await);

    let (status, _) = get_json(&app.router, "/api/podcasts/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
