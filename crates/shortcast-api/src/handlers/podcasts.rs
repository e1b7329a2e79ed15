//! Podcast handlers.
//!
//! Every podcast in a response carries signed audio and cover URLs. Writes
//! act on behalf of the [`Caller`] and only the owner may change a podcast.

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use shortcast_models::{
    DiscoverQuery, MediaUpload, NewPodcast, PodcastCursor, PodcastId, PodcastResponse, UserId,
};
use tracing::info;

use crate::caller::Caller;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Podcast list wrapper.
#[derive(Debug, Serialize)]
pub struct PodcastListResponse {
    pub podcasts: Vec<PodcastResponse>,
}

/// Signed URL lookup result.
#[derive(Debug, Serialize)]
pub struct MediaUrlResponse {
    pub key: String,
    pub url: String,
    /// Seconds the URL stays valid from the moment it was signed.
    pub expires_in_secs: u64,
}

/// Body of a details update.
#[derive(Debug, Deserialize)]
pub struct UpdatePodcastRequest {
    pub title: String,
    pub category: String,
}

// ============================================================================
// Catalog
// ============================================================================

/// Cursor-paginated feed.
///
/// GET /api/podcasts/discover?cursor=&direction=next|prev&limit=
///
/// Malformed parameters fall back to defaults.
pub async fn discover_podcasts(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> ApiResult<Json<PodcastCursor>> {
    let page = state.podcasts.discover(&query).await?;
    Ok(Json(page))
}

/// GET /api/podcasts/:id
pub async fn get_podcast(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PodcastResponse>> {
    let id = parse_podcast_id(&id)?;
    let podcast = state.podcasts.get(id).await?;
    Ok(Json(podcast))
}

/// GET /api/users/:user_id/podcasts
pub async fn list_user_podcasts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PodcastListResponse>> {
    let user_id: UserId = user_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid user id"))?;
    let podcasts = state.podcasts.list_by_user(user_id).await?;
    Ok(Json(PodcastListResponse { podcasts }))
}

/// GET /api/podcasts/category/:category
pub async fn list_category_podcasts(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<PodcastListResponse>> {
    let podcasts = state.podcasts.list_by_category(&category).await?;
    Ok(Json(PodcastListResponse { podcasts }))
}

// ============================================================================
// Writes
// ============================================================================

/// Upload a podcast.
///
/// POST /api/podcasts (multipart: `title`, `category`, `audio`, `cover`)
pub async fn upload_podcast(
    State(state): State<AppState>,
    caller: Caller,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<PodcastResponse>)> {
    let mut title = None;
    let mut category = None;
    let mut audio = None;
    let mut cover = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(read_text(field).await?),
            "category" => category = Some(read_text(field).await?),
            "audio" => audio = Some(read_file(field).await?),
            "cover" => cover = Some(read_file(field).await?),
            _ => {}
        }
    }

    let podcast = NewPodcast {
        title: title.unwrap_or_default(),
        category: category.unwrap_or_default(),
        user_id: caller.user_id,
    };
    let audio = audio.ok_or_else(|| ApiError::bad_request("Missing audio file"))?;
    let cover = cover.ok_or_else(|| ApiError::bad_request("Missing cover file"))?;

    let created = state.podcasts.upload(podcast, audio, cover).await?;
    info!(podcast_id = created.id, user_id = caller.user_id, "Podcast created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Change title and category.
///
/// PUT /api/podcasts/:id
pub async fn update_podcast(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(request): Json<UpdatePodcastRequest>,
) -> ApiResult<Json<PodcastResponse>> {
    let id = parse_podcast_id(&id)?;
    let updated = state
        .podcasts
        .update_details(id, caller.user_id, &request.title, &request.category)
        .await?;
    Ok(Json(updated))
}

/// Replace the cover image.
///
/// PUT /api/podcasts/:id/cover (multipart: `cover`)
pub async fn update_podcast_cover(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<PodcastResponse>> {
    let id = parse_podcast_id(&id)?;

    let mut cover = None;
    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("cover") {
            cover = Some(read_file(field).await?);
        }
    }
    let cover = cover.ok_or_else(|| ApiError::bad_request("Missing cover file"))?;

    let updated = state.podcasts.update_cover(id, caller.user_id, cover).await?;
    Ok(Json(updated))
}

/// DELETE /api/podcasts/:id
pub async fn delete_podcast(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_podcast_id(&id)?;
    state.podcasts.delete(id, caller.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Media
// ============================================================================

/// Stream object content.
///
/// GET /api/podcasts/file/*key
pub async fn get_podcast_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    if key.contains("..") {
        return Err(ApiError::bad_request("Invalid object key"));
    }

    let bytes = state.podcasts.file_content(&key).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&key))
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// Signed URL for one object key.
///
/// GET /api/podcasts/url/*key
pub async fn get_media_url(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<MediaUrlResponse>> {
    let url = state.podcasts.media_url(&key).await?;
    Ok(Json(MediaUrlResponse {
        key,
        url: url.into_string(),
        expires_in_secs: state.podcasts.resolver().config().url_lifetime.as_secs(),
    }))
}

fn parse_podcast_id(raw: &str) -> ApiResult<PodcastId> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid podcast id"))
}

async fn next_field(multipart: &mut Multipart) -> ApiResult<Option<Field<'_>>> {
    multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {}", e)))
}

async fn read_text(field: Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read form field: {}", e)))
}

async fn read_file(field: Field<'_>) -> ApiResult<MediaUpload> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read file data: {}", e)))?;

    Ok(MediaUpload::new(filename, content_type, data.to_vec()))
}

fn content_type_for(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
