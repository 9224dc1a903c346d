//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::db::DbError;
use crate::picks::PickError;

/// Error returned by a handler, rendered as `{"error": "..."}`.
#[derive(Debug, derive_more::Display)]
pub enum ApiError {
    /// Request could not be honored as given.
    #[display("{}", _0)]
    BadRequest(String),

    /// No usable `x-user-id`.
    #[display("Authentication required")]
    Unauthorized,

    /// Authenticated but not an administrator.
    #[display("Administrator access required")]
    Forbidden,

    /// Referenced resource is absent.
    #[display("{}", _0)]
    NotFound(String),

    /// Pick rules refused the operation.
    #[display("{}", _0)]
    Pick(PickError),

    /// Storage or runtime failure. The message is logged, not returned.
    #[display("Internal server error")]
    Internal(String),
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Pick(err) => match err {
                PickError::GameNotFound { .. } | PickError::PickNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                PickError::GameAlreadyStarted { .. } | PickError::InvalidTeamSelection { .. } => {
                    StatusCode::BAD_REQUEST
                }
                PickError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(detail) => error!(%detail, "Request failed"),
            Self::Pick(PickError::Storage(err)) => error!(error = %err, "Pick storage failed"),
            other if status.is_server_error() => error!(error = %other, "Request failed"),
            other => warn!(status = status.as_u16(), error = %other, "Request rejected"),
        }

        let message = match &self {
            Self::Pick(PickError::Storage(_)) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PickError> for ApiError {
    fn from(err: PickError) -> Self {
        Self::Pick(err)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation() {
            Self::BadRequest("Resource already exists".to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Blocking task failed: {}", err))
    }
}
