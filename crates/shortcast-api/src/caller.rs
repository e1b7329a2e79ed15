//! Caller identity for write endpoints.
//!
//! Token verification happens upstream of this service. The gateway forwards
//! the authenticated user id in `X-User-ID`, and write handlers trust it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shortcast_models::UserId;

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "X-User-ID";

/// The user a write request acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-ID header"))?;

        let user_id = raw
            .trim()
            .parse::<UserId>()
            .map_err(|_| ApiError::unauthorized("Invalid X-User-ID header"))?;

        Ok(Caller { user_id })
    }
}
