//! Request identity.
//!
//! Authentication happens upstream; the trusted proxy forwards the
//! authenticated user id in [`USER_ID_HEADER`]. These extractors only resolve
//! that id to a stored user.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use tracing::{debug, instrument};

use super::{ApiError, AppState, blocking};
use crate::db::User;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The authenticated caller, known to be an administrator.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[instrument(skip_all)]
async fn resolve(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let user_id: i32 = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .ok_or(ApiError::Unauthorized)?;

    let repository = state.repository().clone();
    let user = blocking(move || repository.get_user(user_id)).await?;
    match user {
        Some(user) => Ok(user),
        None => {
            debug!(user_id, "Unknown user in identity header");
            Err(ApiError::Unauthorized)
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        resolve(parts, &state).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = resolve(parts, &state).await?;
        if *user.is_admin() {
            Ok(Self(user))
        } else {
            debug!(user_id = user.id(), "Non-admin on admin route");
            Err(ApiError::Forbidden)
        }
    }
}
