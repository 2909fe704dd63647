//! Shop and delivery settings.
//!
//! Each is a single document. Reading seeds the defaults when the collection
//! is empty; patching merges into the stored document.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection, rejection::QueryRejection},
    routing::get,
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use florist_core::{DeliverySettings, ShopSettings, Singleton};

use crate::error::AppError;
use crate::hooks::SettingsSnapshot;
use crate::state::AppState;

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/settings/shop",
            get(show::<ShopSettings>).patch(update::<ShopSettings>),
        )
        .route(
            "/api/settings/delivery",
            get(show::<DeliverySettings>).patch(update::<DeliverySettings>),
        )
        .route("/api/settings/status", get(status))
}

/// `GET /api/settings/{kind}`
pub async fn show<E: Singleton>(State(state): State<AppState>) -> Json<SettingsSnapshot<E>>
{
    let hook = state.singleton::<E>();
    hook.fetch().await;
    Json(hook.snapshot().await)
}

/// `PATCH /api/settings/{kind}`
///
/// # Errors
///
/// Returns 400 for unknown or malformed fields, or the store error if the
/// write fails.
pub async fn update<E: Singleton>(
    State(state): State<AppState>,
    body: Result<Json<E::Patch>, JsonRejection>,
) -> Result<Json<SettingsSnapshot<E>>, AppError>
{
    let Json(patch) = body?;
    let hook = state.singleton::<E>();
    hook.update(patch).await?;
    Ok(Json(hook.snapshot().await))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusParams {
    /// Shop-local time to check; defaults to the server's local time.
    #[serde(default)]
    pub at: Option<NaiveTime>,
}

/// Whether the shop is open and still takes same-day deliveries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopStatus {
    pub at: NaiveTime,
    pub open: bool,
    pub same_day_delivery: bool,
}

/// `GET /api/settings/status[?at=HH:MM]`
///
/// # Errors
///
/// Returns 400 for a malformed time.
pub async fn status(
    State(state): State<AppState>,
    params: Result<Query<StatusParams>, QueryRejection>,
) -> Result<Json<ShopStatus>, AppError> {
    let Query(params) = params?;
    let at = params
        .at
        .unwrap_or_else(|| chrono::Local::now().time());

    let shop = state.singleton::<ShopSettings>();
    let delivery = state.singleton::<DeliverySettings>();
    tokio::join!(shop.fetch(), delivery.fetch());

    let open = shop.settings().await.is_open_at(at);
    Ok(Json(ShopStatus {
        at,
        open,
        same_day_delivery: open && delivery.settings().await.accepts_same_day(at),
    }))
}
