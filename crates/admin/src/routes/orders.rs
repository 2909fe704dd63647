//! Orders.
//!
//! Listing accepts `?status=` to show only orders in one status.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::PathRejection, rejection::QueryRejection},
    routing::{get, patch},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use florist_core::{DocumentId, Order, OrderStatus, ShopSettings};

use super::resources::{create, delete, update};
use crate::error::AppError;
use crate::hooks::{ResourceHook, Snapshot};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create::<Order>))
        .route(
            "/api/orders/{id}",
            patch(update::<Order>).delete(delete::<Order>),
        )
        .route("/api/orders/{id}/total", get(order_total))
}

/// Query string for the order listing.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

fn orders(state: &AppState) -> ResourceHook<Order> {
    state.resource()
}

/// `GET /api/orders[?status=]`
///
/// # Errors
///
/// Returns 400 for an unknown status.
pub async fn list_orders(
    State(state): State<AppState>,
    params: Result<Query<OrderListParams>, QueryRejection>,
) -> Result<Json<Snapshot<Order>>, AppError> {
    let Query(params) = params?;
    let hook = orders(&state);
    match params.status {
        Some(status) => hook.filter_by(Order::STATUS_FIELD, status.as_str()).await,
        None => hook.fetch().await,
    }
    Ok(Json(hook.snapshot().await))
}

/// Order totals in the shop currency.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotal {
    pub id: DocumentId,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    /// Total formatted for display, e.g. `₩45,000`.
    pub display: String,
}

/// `GET /api/orders/{id}/total`
///
/// # Errors
///
/// Returns 404 if the order does not exist, 400 if its amounts overflow.
pub async fn order_total(
    State(state): State<AppState>,
    id: Result<Path<DocumentId>, PathRejection>,
) -> Result<Json<OrderTotal>, AppError> {
    let Path(id) = id?;
    let hook = orders(&state);
    hook.fetch().await;
    let record = hook
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let settings = state.singleton::<ShopSettings>();
    settings.fetch().await;
    let currency = settings.settings().await.currency;

    let order = record.data;
    let overflow = || AppError::BadRequest(format!("order {id} amounts overflow"));
    let subtotal = order.subtotal().ok_or_else(overflow)?;
    let price = order.total_price(currency).ok_or_else(overflow)?;
    Ok(Json(OrderTotal {
        id: record.id,
        subtotal,
        delivery_fee: order.delivery_fee,
        total: price.amount,
        display: price.display(),
    }))
}
