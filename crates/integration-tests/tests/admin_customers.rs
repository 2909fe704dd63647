//! Customer CRUD and search through the HTTP API.

#![allow(clippy::unwrap_used)]

use reqwest::Method;
use reqwest::StatusCode;
use serde_json::{Value, json};

use florist_integration_tests::TestApp;

fn names(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

async fn add_customer(app: &TestApp, name: &str, phone: &str) -> String {
    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/customers",
            &json!({ "name": name, "phone": phone }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;
    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = app.client.get(app.url("/health/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_customer_lifecycle() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get_json("/api/customers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["loading"], json!(false));

    let id = add_customer(&app, "Kim", "010-1234-5678").await;

    let (_, body) = app.get_json("/api/customers").await;
    let customer = &body["items"][0];
    assert_eq!(customer["id"], json!(id));
    assert_eq!(customer["name"], json!("Kim"));
    assert_eq!(customer["created_at"], customer["updated_at"]);

    let (status, body) = app
        .send_json(
            Method::PATCH,
            &format!("/api/customers/{id}"),
            &json!({ "memo": "prefers roses" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let customer = &body["items"][0];
    assert_eq!(customer["memo"], json!("prefers roses"));
    assert_eq!(customer["name"], json!("Kim"));
    assert!(customer["updated_at"].as_i64() >= customer["created_at"].as_i64());

    let (status, body) = app
        .send_json(Method::DELETE, &format!("/api/customers/{id}"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_update_unknown_customer_is_not_found() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .send_json(
            Method::PATCH,
            "/api/customers/does-not-exist",
            &json!({ "name": "Nobody" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_invalid_bodies_are_bad_requests() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .send_json(Method::POST, "/api/customers", &json!({ "name": "Kim" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = add_customer(&app, "Kim", "010-1234-5678").await;
    let (status, _) = app
        .send_json(
            Method::PATCH,
            &format!("/api/customers/{id}"),
            &json!({ "created_at": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_search_by_prefix() {
    let app = TestApp::spawn().await;
    add_customer(&app, "Lee", "010-3333-3333").await;
    add_customer(&app, "Kim2", "010-2222-2222").await;
    add_customer(&app, "Kim", "010-1111-1111").await;

    let (status, body) = app.get_json("/api/customers/search?q=Kim").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Kim", "Kim2"]);

    let (_, body) = app.get_json("/api/customers/search?q=%20%20").await;
    assert_eq!(names(&body).len(), 3);

    let (_, body) = app.get_json("/api/customers/search?q=Park").await;
    assert!(names(&body).is_empty());
}
