//! Create-and-share flow for order photo albums.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use florist_core::AlbumId;

use super::{PhotosApi, PhotosError};

/// Album creation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAlbumRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Created album, as returned to the admin UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumResponse {
    pub album_id: AlbumId,
    /// Empty when sharing failed.
    pub shareable_url: String,
    pub title: String,
    pub description: Option<String>,
}

/// Create an album and try to share it.
///
/// The title is validated before anything else, so a blank title never
/// reaches Google and is rejected even when credentials are missing. A
/// failed share still returns the album, with an empty URL.
///
/// # Errors
///
/// - `PhotosError::InvalidTitle` if the title is missing or blank
/// - `PhotosError::NotConfigured` if `api` is `None`
/// - token exchange or album creation errors from Google
#[instrument(skip_all)]
pub async fn create_shared_album(
    api: Option<&dyn PhotosApi>,
    request: CreateAlbumRequest,
) -> Result<AlbumResponse, PhotosError> {
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(PhotosError::InvalidTitle)?
        .to_string();

    let api = api.ok_or(PhotosError::NotConfigured)?;

    let token = api.access_token().await?;
    let album = api.create_album(&token, &title).await?;
    info!(album_id = %album.id, "album created");

    let shareable_url = match api.share_album(&token, &album.id).await {
        Ok(url) => url,
        Err(e) => {
            warn!(album_id = %album.id, error = %e, "album created but sharing failed");
            String::new()
        }
    };

    Ok(AlbumResponse {
        album_id: album.id,
        shareable_url,
        title,
        description: request.description,
    })
}
