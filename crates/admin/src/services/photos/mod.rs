//! Google Photos Library API client for shared order albums.
//!
//! Each album creation exchanges the configured refresh token for a
//! short-lived access token, creates the album, then asks Google to share it.
//!
//! # API Reference
//!
//! - Token endpoint: `https://oauth2.googleapis.com/token` (refresh-token grant)
//! - Base URL: `https://photoslibrary.googleapis.com`
//! - `POST /v1/albums` and `POST /v1/albums/{albumId}:share`

mod album;
mod auth;

pub use album::{AlbumResponse, CreateAlbumRequest, create_shared_album};
pub use auth::{AccessToken, exchange_refresh_token};

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use florist_core::AlbumId;

use crate::config::GooglePhotosConfig;

/// Errors from the album-creation flow.
#[derive(Debug, Error)]
pub enum PhotosError {
    /// The album title was missing or blank.
    #[error("Album title is required")]
    InvalidTitle,

    /// Client ID, client secret or refresh token is not configured.
    #[error("Google Photos credentials are not configured")]
    NotConfigured,

    /// The token endpoint refused the refresh token.
    #[error("Token exchange failed: {status} - {message}")]
    TokenExchange { status: u16, message: String },

    /// The Library API returned an error response.
    #[error("Google Photos API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl PhotosError {
    /// HTTP status to answer with.
    ///
    /// Upstream failures keep Google's status; transport and decoding
    /// failures are a bad gateway.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidTitle => StatusCode::BAD_REQUEST,
            Self::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TokenExchange { status, .. } | Self::Api { status, .. } => {
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Http(_) | Self::Parse(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to return to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::TokenExchange { message, .. } | Self::Api { message, .. } => message.clone(),
            Self::Http(_) | Self::Parse(_) => "Google Photos request failed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// An album as created by Google.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAlbum {
    pub id: AlbumId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub product_url: Option<String>,
}

/// The album-creation operations, so the flow can run against a fake.
#[async_trait]
pub trait PhotosApi: Send + Sync {
    /// Obtain a bearer token for the Library API.
    async fn access_token(&self) -> Result<AccessToken, PhotosError>;

    /// Create an album with `title`.
    async fn create_album(&self, token: &AccessToken, title: &str)
    -> Result<CreatedAlbum, PhotosError>;

    /// Share an album and return its shareable URL.
    async fn share_album(&self, token: &AccessToken, album_id: &AlbumId)
    -> Result<String, PhotosError>;
}

#[derive(Serialize)]
struct CreateAlbumBody<'a> {
    album: NewAlbum<'a>,
}

#[derive(Serialize)]
struct NewAlbum<'a> {
    title: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareAlbumBody {
    shared_album_options: SharedAlbumOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SharedAlbumOptions {
    is_collaborative: bool,
    is_commentable: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareAlbumResponse {
    #[serde(default)]
    share_info: Option<ShareInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareInfo {
    #[serde(default)]
    shareable_url: Option<String>,
}

/// `{"error": {"code": 400, "message": "...", "status": "INVALID_ARGUMENT"}}`
#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Google Photos Library API client.
#[derive(Clone)]
pub struct GooglePhotosClient {
    inner: Arc<GooglePhotosClientInner>,
}

struct GooglePhotosClientInner {
    client: reqwest::Client,
    config: GooglePhotosConfig,
}

impl GooglePhotosClient {
    /// Create a new Google Photos client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GooglePhotosConfig) -> Result<Self, PhotosError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(GooglePhotosClientInner {
                client,
                config: config.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PhotosError> {
        self.inner
            .config
            .api_url
            .join(path)
            .map_err(|e| PhotosError::Parse(format!("Invalid API URL for {path}: {e}")))
    }

    /// POST a JSON body with the bearer token and decode the JSON response.
    async fn post<T, B>(&self, url: Url, token: &AccessToken, body: &B) -> Result<T, PhotosError>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + Sync,
    {
        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(token.secret().expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| PhotosError::Parse(format!("Failed to parse response: {e}")));
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ApiErrorResponse>(&text)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or(text);

        Err(PhotosError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PhotosApi for GooglePhotosClient {
    async fn access_token(&self) -> Result<AccessToken, PhotosError> {
        let config = &self.inner.config;
        exchange_refresh_token(
            &self.inner.client,
            &config.token_url,
            &config.client_id,
            &config.client_secret,
            &config.refresh_token,
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn create_album(
        &self,
        token: &AccessToken,
        title: &str,
    ) -> Result<CreatedAlbum, PhotosError> {
        let url = self.endpoint("v1/albums")?;
        self.post(
            url,
            token,
            &CreateAlbumBody {
                album: NewAlbum { title },
            },
        )
        .await
    }

    #[instrument(skip(self, token), fields(album_id = %album_id))]
    async fn share_album(
        &self,
        token: &AccessToken,
        album_id: &AlbumId,
    ) -> Result<String, PhotosError> {
        let url = self.endpoint(&format!("v1/albums/{album_id}:share"))?;
        let body = ShareAlbumBody {
            shared_album_options: SharedAlbumOptions {
                is_collaborative: false,
                is_commentable: true,
            },
        };
        let response: ShareAlbumResponse = self.post(url, token, &body).await?;

        response
            .share_info
            .and_then(|info| info.shareable_url)
            .ok_or_else(|| PhotosError::Parse("Share response has no shareable URL".to_string()))
    }
}

impl std::fmt::Debug for GooglePhotosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GooglePhotosClient")
            .field("api_url", &self.inner.config.api_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(api_url: &str) -> GooglePhotosConfig {
        GooglePhotosConfig {
            client_id: "client".to_string(),
            client_secret: SecretString::from("secret"),
            refresh_token: SecretString::from("refresh"),
            token_url: Url::parse("https://oauth2.googleapis.com/token").unwrap(),
            api_url: Url::parse(api_url).unwrap(),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(PhotosError::InvalidTitle.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PhotosError::NotConfigured.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let api = PhotosError::Api {
            status: 403,
            message: "insufficient scopes".to_string(),
        };
        assert_eq!(api.status(), StatusCode::FORBIDDEN);
        assert_eq!(api.public_message(), "insufficient scopes");

        let odd = PhotosError::TokenExchange {
            status: 302,
            message: "moved".to_string(),
        };
        assert_eq!(odd.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            PhotosError::Parse("bad json".to_string()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_not_configured_message() {
        assert_eq!(
            PhotosError::NotConfigured.public_message(),
            "Google Photos credentials are not configured"
        );
    }

    #[test]
    fn test_endpoints() {
        let client =
            GooglePhotosClient::new(&config("https://photoslibrary.googleapis.com")).unwrap();
        assert_eq!(
            client.endpoint("v1/albums").unwrap().as_str(),
            "https://photoslibrary.googleapis.com/v1/albums"
        );
        assert_eq!(
            client.endpoint("v1/albums/AF1Qip:share").unwrap().as_str(),
            "https://photoslibrary.googleapis.com/v1/albums/AF1Qip:share"
        );
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(CreateAlbumBody {
            album: NewAlbum { title: "Kim wedding" },
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"album": {"title": "Kim wedding"}}));

        let body = serde_json::to_value(ShareAlbumBody {
            shared_album_options: SharedAlbumOptions {
                is_collaborative: false,
                is_commentable: true,
            },
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "sharedAlbumOptions": {"isCollaborative": false, "isCommentable": true}
            })
        );
    }
}
