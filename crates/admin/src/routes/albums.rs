//! Shared photo albums for orders.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::error::AppError;
use crate::services::photos::{AlbumResponse, CreateAlbumRequest, create_shared_album};
use crate::state::AppState;

/// Build the albums router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/albums", post(create_album))
}

/// `POST /api/albums`
///
/// # Errors
///
/// Returns 400 for a missing or blank title, 500 when Google credentials are
/// not configured, and Google's status when it rejects a call.
pub async fn create_album(
    State(state): State<AppState>,
    body: Result<Json<CreateAlbumRequest>, JsonRejection>,
) -> Result<Json<AlbumResponse>, AppError> {
    let Json(request) = body?;
    let album = create_shared_album(state.photos(), request).await?;
    Ok(Json(album))
}
