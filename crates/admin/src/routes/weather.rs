//! Weather widget.

use axum::{Json, Router, extract::State, routing::get};

use crate::error::AppError;
use crate::services::WeatherSummary;
use crate::state::AppState;

/// Build the weather router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/weather", get(today))
}

/// `GET /api/weather`: today's forecast for the shop.
///
/// # Errors
///
/// Returns 500 when no API key is configured and 502 when the forecast
/// cannot be read.
pub async fn today(State(state): State<AppState>) -> Result<Json<WeatherSummary>, AppError> {
    Ok(Json(state.weather().today().await?))
}
