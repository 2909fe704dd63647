//! Per-district delivery fees.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::{get, patch},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use florist_core::{DeliveryFee, DeliverySettings};

use super::resources::{create, delete, list, search, update};
use crate::error::AppError;
use crate::state::AppState;

/// Build the delivery fees router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/delivery-fees",
            get(list::<DeliveryFee>).post(create::<DeliveryFee>),
        )
        .route("/api/delivery-fees/search", get(search::<DeliveryFee>))
        .route("/api/delivery-fees/quote", get(quote))
        .route(
            "/api/delivery-fees/{id}",
            patch(update::<DeliveryFee>).delete(delete::<DeliveryFee>),
        )
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub district: String,
    #[serde(default)]
    pub subtotal: Decimal,
}

/// Delivery fee for an order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub district: String,
    /// The district's own fee, if one is configured.
    pub district_fee: Option<Decimal>,
    pub fee: Decimal,
}

/// `GET /api/delivery-fees/quote?district=&subtotal=`
///
/// Uses the district's fee when one exists, else the base fee; orders at or
/// above the free-delivery threshold ship free.
///
/// # Errors
///
/// Returns 400 for a malformed query string.
pub async fn quote(
    State(state): State<AppState>,
    params: Result<Query<QuoteParams>, QueryRejection>,
) -> Result<Json<Quote>, AppError> {
    let Query(params) = params?;
    let district = params.district.trim().to_string();

    let fees = state.resource::<DeliveryFee>();
    fees.fetch().await;
    let district_fee = fees
        .items()
        .await
        .into_iter()
        .find(|record| record.data.district == district)
        .map(|record| record.data.fee);

    let settings = state.singleton::<DeliverySettings>();
    settings.fetch().await;
    let fee = settings
        .settings()
        .await
        .fee_for(district_fee, params.subtotal);

    Ok(Json(Quote {
        district,
        district_fee,
        fee,
    }))
}
