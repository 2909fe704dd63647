//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (store ping)
//!
//! # Customers
//! GET    /api/customers                 - List, natural order
//! POST   /api/customers                 - Add
//! GET    /api/customers/search?q=       - Prefix search by name
//! PATCH  /api/customers/{id}            - Update
//! DELETE /api/customers/{id}            - Delete
//!
//! # Orders
//! GET    /api/orders?status=            - List, optionally filtered by status
//! POST   /api/orders                    - Add
//! PATCH  /api/orders/{id}               - Update
//! DELETE /api/orders/{id}               - Delete
//! GET    /api/orders/{id}/total         - Subtotal plus delivery fee
//!
//! # Materials
//! GET    /api/materials                 - List
//! POST   /api/materials                 - Add
//! GET    /api/materials/search?q=       - Prefix search by name
//! GET    /api/materials/reorder         - Stock at or below the reorder point
//! PATCH  /api/materials/{id}            - Update
//! DELETE /api/materials/{id}            - Delete
//!
//! # Delivery fees
//! GET    /api/delivery-fees             - List
//! POST   /api/delivery-fees             - Add
//! GET    /api/delivery-fees/search?q=   - Prefix search by district
//! GET    /api/delivery-fees/quote       - Fee for a district and subtotal
//! PATCH  /api/delivery-fees/{id}        - Update
//! DELETE /api/delivery-fees/{id}        - Delete
//!
//! # Settings
//! GET    /api/settings/shop             - Shop settings (seeded on first read)
//! PATCH  /api/settings/shop             - Update shop settings
//! GET    /api/settings/delivery         - Delivery settings (seeded on first read)
//! PATCH  /api/settings/delivery         - Update delivery settings
//! GET    /api/settings/status?at=       - Open now? Same-day delivery still possible?
//!
//! # External services
//! POST   /api/albums                    - Create a shared Google Photos album
//! GET    /api/weather                   - Today's forecast
//! ```

pub mod albums;
pub mod customers;
pub mod delivery_fees;
pub mod health;
pub mod materials;
pub mod orders;
pub mod resources;
pub mod settings;
pub mod weather;

use axum::Router;

use crate::state::AppState;

/// Build the full admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(customers::router())
        .merge(orders::router())
        .merge(materials::router())
        .merge(delivery_fees::router())
        .merge(settings::router())
        .merge(albums::router())
        .merge(weather::router())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;
    use crate::store::StoreProvider;

    async fn app() -> Router {
        let config = AdminConfig::local();
        let store = StoreProvider::new()
            .get_or_init(&config.store)
            .await
            .unwrap();
        routes().with_state(AppState::new(config, store).unwrap())
    }

    async fn call(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_order_status_filter_and_total() {
        let app = app().await;
        let order = json!({
            "customer_name": "Kim",
            "customer_phone": "010-1234-5678",
            "items": [{ "product": "Rose bouquet", "quantity": 2, "unit_price": "22500" }],
            "delivery_fee": "5000",
        });

        let (status, created) = call(app.clone(), "POST", "/api/orders", Some(order)).await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        let id = created["id"].as_str().unwrap().to_string();

        let (_, pending) = call(app.clone(), "GET", "/api/orders?status=pending", None).await;
        assert_eq!(pending["items"].as_array().unwrap().len(), 1);

        let (_, completed) = call(app.clone(), "GET", "/api/orders?status=completed", None).await;
        assert!(completed["items"].as_array().unwrap().is_empty());

        let (status, total) = call(app, "GET", &format!("/api/orders/{id}/total"), None).await;
        assert_eq!(status, StatusCode::OK, "{total}");
        assert_eq!(total["total"], json!("50000"));
    }

    #[tokio::test]
    async fn test_order_total_overflow_is_bad_request() {
        let app = app().await;
        let order = json!({
            "customer_name": "Kim",
            "customer_phone": "010-1234-5678",
            "items": [{
                "product": "Rose bouquet",
                "quantity": 2,
                "unit_price": "79228162514264337593543950335",
            }],
            "delivery_fee": "0",
        });

        let (status, created) = call(app.clone(), "POST", "/api/orders", Some(order)).await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = call(app, "GET", &format!("/api/orders/{id}/total"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }

    #[tokio::test]
    async fn test_concurrent_list_and_search_do_not_share_results() {
        let app = app().await;
        let customers = [
            ("Kim", "010-1111-1111"),
            ("Kima", "010-2222-2222"),
            ("Lee", "010-3333-3333"),
        ];
        for (name, phone) in customers {
            let body = json!({ "name": name, "phone": phone });
            let (status, _) = call(app.clone(), "POST", "/api/customers", Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let app = app.clone();
            tasks.spawn(async move {
                if i % 2 == 0 {
                    let (_, body) = call(app, "GET", "/api/customers", None).await;
                    (false, body["items"].as_array().unwrap().len())
                } else {
                    let (_, body) = call(app, "GET", "/api/customers/search?q=Kim", None).await;
                    (true, body["items"].as_array().unwrap().len())
                }
            });
        }

        while let Some(result) = tasks.join_next().await {
            let (is_search, len) = result.unwrap();
            assert_eq!(len, if is_search { 2 } else { 3 });
        }
    }

    #[tokio::test]
    async fn test_shop_status_follows_hours_and_cutoff() {
        let app = app().await;

        let (status, morning) =
            call(app.clone(), "GET", "/api/settings/status?at=10:00", None).await;
        assert_eq!(status, StatusCode::OK, "{morning}");
        assert_eq!(morning["open"], json!(true));
        assert_eq!(morning["sameDayDelivery"], json!(true));

        let (_, afternoon) = call(app.clone(), "GET", "/api/settings/status?at=15:00", None).await;
        assert_eq!(afternoon["open"], json!(true));
        assert_eq!(afternoon["sameDayDelivery"], json!(false));

        let (_, night) = call(app.clone(), "GET", "/api/settings/status?at=21:00", None).await;
        assert_eq!(night["open"], json!(false));
        assert_eq!(night["sameDayDelivery"], json!(false));

        let (status, _) = call(app, "GET", "/api/settings/status?at=noon", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_order_status_is_bad_request() {
        let (status, _) = call(app().await, "GET", "/api/orders?status=lost", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delivery_quote_uses_district_fee() {
        let app = app().await;
        let (status, _) = call(
            app.clone(),
            "POST",
            "/api/delivery-fees",
            Some(json!({ "district": "Gangnam", "fee": "7000" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, quote) = call(
            app,
            "GET",
            "/api/delivery-fees/quote?district=Gangnam&subtotal=10000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{quote}");
        assert_eq!(quote["fee"], json!("7000"));
    }
}
