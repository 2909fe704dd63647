//! Flower and supply inventory.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, patch},
};

use florist_core::{Material, Record};

use super::resources::{create, delete, list, search, update};
use crate::state::AppState;

/// Build the materials router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/materials",
            get(list::<Material>).post(create::<Material>),
        )
        .route("/api/materials/search", get(search::<Material>))
        .route("/api/materials/reorder", get(reorder))
        .route(
            "/api/materials/{id}",
            patch(update::<Material>).delete(delete::<Material>),
        )
}

/// Materials at or below their reorder level, in name order.
pub async fn reorder(State(state): State<AppState>) -> Json<Vec<Record<Material>>> {
    let hook = state.resource::<Material>();
    hook.fetch().await;
    Json(
        hook.items()
            .await
            .into_iter()
            .filter(|record| record.data.needs_reorder())
            .collect(),
    )
}
