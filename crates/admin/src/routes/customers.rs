//! Customer records.

use axum::{
    Router,
    routing::{get, patch},
};

use florist_core::Customer;

use super::resources::{create, delete, list, search, update};
use crate::state::AppState;

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/customers",
            get(list::<Customer>).post(create::<Customer>),
        )
        .route("/api/customers/search", get(search::<Customer>))
        .route(
            "/api/customers/{id}",
            patch(update::<Customer>).delete(delete::<Customer>),
        )
}
