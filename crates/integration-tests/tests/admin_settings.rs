//! Settings singletons through the HTTP API.

#![allow(clippy::unwrap_used)]

use reqwest::{Method, StatusCode};
use serde_json::json;

use florist_integration_tests::TestApp;

#[tokio::test]
async fn test_first_read_seeds_defaults() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get_json("/api/settings/shop").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!("shop"));
    assert_eq!(body["shop_name"], json!("Flower Shop"));
    assert_eq!(body["loading"], json!(false));

    let created_at = body["created_at"].clone();
    let (_, body) = app.get_json("/api/settings/shop").await;
    assert_eq!(body["created_at"], created_at);
}

#[tokio::test]
async fn test_patch_merges_into_defaults() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send_json(
            Method::PATCH,
            "/api/settings/shop",
            &json!({ "shop_name": "Rose & Co" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["shop_name"], json!("Rose & Co"));
    assert_eq!(body["open_time"], json!("09:00:00"));

    let (_, body) = app.get_json("/api/settings/shop").await;
    assert_eq!(body["shop_name"], json!("Rose & Co"));
}

#[tokio::test]
async fn test_settings_collections_are_independent() {
    let app = TestApp::spawn().await;

    let (_, shop) = app.get_json("/api/settings/shop").await;
    let (status, delivery) = app.get_json("/api/settings/delivery").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivery["id"], json!("delivery"));
    assert!(delivery.get("shop_name").is_none());
    assert!(shop.get("base_fee").is_none());
}

#[tokio::test]
async fn test_unknown_settings_field_is_rejected() {
    let app = TestApp::spawn().await;
    let (status, _) = app
        .send_json(
            Method::PATCH,
            "/api/settings/delivery",
            &json!({ "shop_name": "wrong collection" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
