//! Today's weather for the dashboard widget.
//!
//! Reads the `OpenWeatherMap` 5-day/3-hour forecast for the shop's location
//! (Seoul city hall) and condenses today's entries into a low, a high and a
//! condition label. Summaries are cached per date for ten minutes.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::WeatherConfig;

/// Seoul city hall.
pub const LATITUDE: f64 = 37.5665;
pub const LONGITUDE: f64 = 126.9780;

const CACHE_TTL: Duration = Duration::from_secs(600);

/// Errors that can occur when fetching the forecast.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather API key is not configured")]
    MissingApiKey,

    /// The forecast service returned an error response.
    #[error("Weather API error: {status} - {message}")]
    Upstream { status: u16, message: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse the forecast.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The forecast contained no entries.
    #[error("Forecast contained no entries")]
    EmptyForecast,
}

impl WeatherError {
    /// HTTP status to answer with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Http(_) | Self::Parse(_) | Self::EmptyForecast => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to return to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Upstream { message, .. } => message.clone(),
            Self::Http(_) | Self::Parse(_) => "Weather request failed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Forecast response (`/data/2.5/forecast`).
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

/// One 3-hour forecast slot.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    /// Slot start, Unix seconds.
    pub dt: i64,
    /// Slot start as `YYYY-MM-DD HH:MM:SS` (UTC).
    #[serde(default)]
    pub dt_txt: Option<String>,
    pub main: Readings,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

impl ForecastEntry {
    /// UTC date of the slot.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.dt_txt
            .as_deref()
            .and_then(|txt| NaiveDateTime::parse_from_str(txt, "%Y-%m-%d %H:%M:%S").ok())
            .map(|dt| dt.date())
            .or_else(|| DateTime::from_timestamp(self.dt, 0).map(|dt| dt.date_naive()))
    }

    fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Readings {
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    /// Condition group, e.g. `Clouds`.
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// `{"cod": 401, "message": "Invalid API key. ..."}`
#[derive(Deserialize)]
struct UpstreamError {
    #[serde(default)]
    message: Option<String>,
}

/// Today's weather, as returned to the admin UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    pub date: NaiveDate,
    pub min_temp: i64,
    pub max_temp: i64,
    /// Korean label for the condition group.
    pub condition: String,
    pub icon: Option<String>,
}

/// Korean label for an `OpenWeatherMap` condition group.
///
/// Unknown groups are returned unchanged.
#[must_use]
pub fn translate_condition(main: &str) -> &str {
    match main {
        "Clear" => "맑음",
        "Clouds" => "흐림",
        "Rain" => "비",
        "Drizzle" => "이슬비",
        "Thunderstorm" => "뇌우",
        "Snow" => "눈",
        "Mist" | "Fog" => "안개",
        "Haze" => "연무",
        "Dust" => "황사",
        "Smoke" => "연기",
        "Sand" => "모래바람",
        other => other,
    }
}

#[allow(clippy::cast_possible_truncation)] // Temperatures are far inside i64 range
fn round_temp(temp: f64) -> i64 {
    temp.round() as i64
}

/// Condense a forecast into `today`'s summary.
///
/// Uses every entry dated `today`; if there are none, falls back to the first
/// entry with its temperature as both low and high. Returns `None` only for
/// an empty forecast.
#[must_use]
pub fn summarize(entries: &[ForecastEntry], today: NaiveDate) -> Option<WeatherSummary> {
    let same_day: Vec<&ForecastEntry> = entries
        .iter()
        .filter(|e| e.date() == Some(today))
        .collect();

    let (representative, min, max) = if let Some(first) = same_day.first() {
        let temps = same_day.iter().map(|e| e.main.temp);
        let min = temps.clone().fold(f64::INFINITY, f64::min);
        let max = temps.fold(f64::NEG_INFINITY, f64::max);
        (*first, min, max)
    } else {
        let first = entries.first()?;
        (first, first.main.temp, first.main.temp)
    };

    let condition = representative.condition();
    Some(WeatherSummary {
        date: today,
        min_temp: round_temp(min),
        max_temp: round_temp(max),
        condition: condition
            .map(|c| translate_condition(&c.main).to_string())
            .unwrap_or_default(),
        icon: condition.map(|c| c.icon.clone()).filter(|i| !i.is_empty()),
    })
}

/// Forecast client with a per-date summary cache.
#[derive(Clone)]
pub struct WeatherClient {
    inner: Arc<WeatherClientInner>,
}

struct WeatherClientInner {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    api_url: Url,
    cache: Cache<NaiveDate, WeatherSummary>,
}

impl WeatherClient {
    /// Create a new weather client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(WeatherClientInner {
                client,
                api_key: config.api_key.clone(),
                api_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// Summary for the current UTC date.
    ///
    /// # Errors
    ///
    /// See [`summary_for`](Self::summary_for).
    pub async fn today(&self) -> Result<WeatherSummary, WeatherError> {
        self.summary_for(Utc::now().date_naive()).await
    }

    /// Summary for `date`, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// - `WeatherError::MissingApiKey` if no key is configured
    /// - `WeatherError::Upstream` with the forecast service's status
    /// - `WeatherError::EmptyForecast` if the forecast has no entries
    #[instrument(skip(self))]
    pub async fn summary_for(&self, date: NaiveDate) -> Result<WeatherSummary, WeatherError> {
        let api_key = self
            .inner
            .api_key
            .as_ref()
            .ok_or(WeatherError::MissingApiKey)?;

        if let Some(summary) = self.inner.cache.get(&date).await {
            debug!("weather cache hit");
            return Ok(summary);
        }

        let forecast = self.fetch_forecast(api_key).await?;
        let summary = summarize(&forecast.list, date).ok_or(WeatherError::EmptyForecast)?;
        self.inner.cache.insert(date, summary.clone()).await;
        Ok(summary)
    }

    fn forecast_url(&self, api_key: &SecretString) -> Url {
        let mut url = self.inner.api_url.clone();
        url.query_pairs_mut()
            .append_pair("lat", &LATITUDE.to_string())
            .append_pair("lon", &LONGITUDE.to_string())
            .append_pair("units", "metric")
            .append_pair("appid", api_key.expose_secret());
        url
    }

    async fn fetch_forecast(
        &self,
        api_key: &SecretString,
    ) -> Result<ForecastResponse, WeatherError> {
        let response = self
            .inner
            .client
            .get(self.forecast_url(api_key))
            .send()
            .await
            .map_err(|e| WeatherError::Http(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| WeatherError::Parse(format!("Failed to parse forecast: {e}")));
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<UpstreamError>(&text)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or(text);

        Err(WeatherError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("api_url", &self.inner.api_url.as_str())
            .field("configured", &self.inner.api_key.is_some())
            .finish_non_exhaustive()
    }
}
