//! Integration test harness for the florist admin API.
//!
//! [`TestApp`] serves the real router on an ephemeral port over an in-memory
//! store. [`MockGoogle`] and [`MockWeather`] stand in for the upstream APIs
//! and count the requests they receive.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p florist-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use florist_admin::config::{AdminConfig, GooglePhotosConfig};
use florist_admin::state::AppState;
use florist_admin::store::StoreProvider;

/// A running admin server.
pub struct TestApp {
    pub address: SocketAddr,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn with the local configuration: memory store, no external services.
    pub async fn spawn() -> Self {
        Self::spawn_with(AdminConfig::local()).await
    }

    /// Spawn with a custom configuration.
    pub async fn spawn_with(config: AdminConfig) -> Self {
        let provider = StoreProvider::new();
        let store = provider
            .get_or_init(&config.store)
            .await
            .expect("Failed to initialize store");
        let state = AppState::new(config, store).expect("Failed to build state");
        let app = florist_admin::app(state);

        let address = serve(app).await;
        Self {
            address,
            client: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed");
        decode(response).await
    }

    /// Send `body` with `method` to `path` and decode the JSON response.
    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> (StatusCode, Value) {
        let response = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed");
        decode(response).await
    }
}

async fn decode(response: reqwest::Response) -> (StatusCode, Value) {
    let status = StatusCode::from_u16(response.status().as_u16()).expect("Invalid status");
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// Bind an ephemeral port and serve `app` in the background.
async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let address = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });
    address
}

/// Request counters for [`MockGoogle`].
#[derive(Default)]
pub struct GoogleHits {
    pub token: AtomicUsize,
    pub create: AtomicUsize,
    pub share: AtomicUsize,
    fail_share: AtomicBool,
}

/// Fake OAuth token endpoint and Photos Library API.
pub struct MockGoogle {
    pub address: SocketAddr,
    pub hits: Arc<GoogleHits>,
}

impl MockGoogle {
    pub async fn spawn() -> Self {
        let hits = Arc::new(GoogleHits::default());
        let app = Router::new()
            .route("/token", post(google_token))
            .route("/v1/albums", post(google_create_album))
            .route("/v1/albums/{action}", post(google_share_album))
            .with_state(Arc::clone(&hits));
        Self {
            address: serve(app).await,
            hits,
        }
    }

    /// Make every share call answer 500.
    pub fn fail_share(&self) {
        self.hits.fail_share.store(true, Ordering::SeqCst);
    }

    /// Total requests received.
    #[must_use]
    pub fn total_hits(&self) -> usize {
        self.hits.token.load(Ordering::SeqCst)
            + self.hits.create.load(Ordering::SeqCst)
            + self.hits.share.load(Ordering::SeqCst)
    }

    /// Credentials pointing at this server.
    #[must_use]
    pub fn config(&self) -> GooglePhotosConfig {
        let base = format!("http://{}/", self.address);
        GooglePhotosConfig {
            client_id: "test-client".to_string(),
            client_secret: SecretString::from("test-secret"),
            refresh_token: SecretString::from("test-refresh"),
            token_url: Url::parse(&format!("{base}token")).expect("Invalid URL"),
            api_url: Url::parse(&base).expect("Invalid URL"),
        }
    }
}

async fn google_token(State(hits): State<Arc<GoogleHits>>) -> Json<Value> {
    hits.token.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "access_token": "test-access", "expires_in": 3599, "token_type": "Bearer" }))
}

async fn google_create_album(
    State(hits): State<Arc<GoogleHits>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    hits.create.fetch_add(1, Ordering::SeqCst);
    let title = body["album"]["title"].as_str().unwrap_or_default();
    Json(json!({
        "id": "album-1",
        "title": title,
        "productUrl": "https://photos.google.com/lr/album/album-1",
    }))
}

async fn google_share_album(
    State(hits): State<Arc<GoogleHits>>,
    Path(action): Path<String>,
) -> (StatusCode, Json<Value>) {
    hits.share.fetch_add(1, Ordering::SeqCst);
    if hits.fail_share.load(Ordering::SeqCst) || !action.ends_with(":share") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "code": 500, "message": "backend error" } })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "shareInfo": { "shareableUrl": "https://photos.app.goo.gl/shared" } })),
    )
}

/// Fake forecast endpoint serving a fixed body.
pub struct MockWeather {
    pub address: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct WeatherState {
    hits: Arc<AtomicUsize>,
    body: Arc<Value>,
}

impl MockWeather {
    pub async fn spawn(body: Value) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/data/2.5/forecast", get(forecast))
            .with_state(WeatherState {
                hits: Arc::clone(&hits),
                body: Arc::new(body),
            });
        Self {
            address: serve(app).await,
            hits,
        }
    }

    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/data/2.5/forecast", self.address)).expect("Invalid URL")
    }
}

async fn forecast(State(state): State<WeatherState>) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    Json((*state.body).clone())
}
