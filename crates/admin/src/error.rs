//! Unified error handling for the admin API.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::hooks::HookError;
use crate::services::{PhotosError, WeatherError};
use crate::store::StoreError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A resource write failed.
    #[error("Store error: {0}")]
    Hook(#[from] HookError),

    /// Album creation failed.
    #[error("Photos error: {0}")]
    Photos(#[from] PhotosError),

    /// Weather lookup failed.
    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Hook(HookError::Store(StoreError::NotFound { .. })) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Hook(HookError::Store(StoreError::Timeout(_))) => StatusCode::GATEWAY_TIMEOUT,
            Self::Hook(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Photos(e) => e.status(),
            Self::Weather(e) => e.status(),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message returned to the client. Internal details are not exposed.
    fn public_message(&self) -> String {
        match self {
            Self::Hook(HookError::Store(e @ StoreError::NotFound { .. })) => {
                format!("Not found: {e}")
            }
            Self::Hook(HookError::Store(StoreError::Timeout(_))) => {
                "Store request timed out".to_string()
            }
            Self::Hook(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Photos(e) => e.public_message(),
            Self::Weather(e) => e.public_message(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use florist_core::DocumentId;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        let missing = HookError::Store(StoreError::NotFound {
            collection: "customers".to_string(),
            id: DocumentId::new("abc"),
        });
        assert_eq!(get_status(missing.into()), StatusCode::NOT_FOUND);

        let timeout = HookError::Store(StoreError::Timeout(Duration::from_secs(10)));
        assert_eq!(get_status(timeout.into()), StatusCode::GATEWAY_TIMEOUT);

        let unavailable = HookError::Store(StoreError::Unavailable("down".to_string()));
        assert_eq!(
            get_status(unavailable.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(PhotosError::InvalidTitle.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(WeatherError::EmptyForecast.into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(
                PhotosError::Api {
                    status: 429,
                    message: "quota".to_string()
                }
                .into()
            ),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Hook(HookError::Store(StoreError::Unavailable(
            "password authentication failed for user florist".to_string(),
        )));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Weather(WeatherError::MissingApiKey);
        assert_eq!(err.public_message(), "Weather API key is not configured");
    }
}
