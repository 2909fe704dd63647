//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (`STORE_BACKEND=postgres`, the default)
//! - `FLORIST_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `FLORIST_HOST` - Bind address (default: 127.0.0.1)
//! - `FLORIST_PORT` - Listen port (default: 3001)
//! - `STORE_BACKEND` - `postgres` or `memory` (default: postgres)
//! - `STORE_CACHE_CAPACITY` - Cached listings kept (default: 1000)
//! - `STORE_CACHE_TTL_SECS` - Listing cache lifetime (default: 5)
//! - `STORE_CALL_TIMEOUT_SECS` - Timeout for each store call (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `LOG_FORMAT` - `json` for flattened JSON logs, anything else for text
//!
//! ## Optional (Google Photos - enables album creation)
//! - `GOOGLE_CLIENT_ID` - OAuth client ID
//! - `GOOGLE_CLIENT_SECRET` - OAuth client secret
//! - `GOOGLE_REFRESH_TOKEN` - Long-lived refresh token for the shop account
//! - `GOOGLE_TOKEN_URL` - Token endpoint (default: <https://oauth2.googleapis.com/token>)
//! - `GOOGLE_PHOTOS_API_URL` - Library API base (default: <https://photoslibrary.googleapis.com>)
//!
//! ## Optional (weather widget)
//! - `WEATHER_API_KEY` - `OpenWeatherMap` API key
//! - `WEATHER_API_URL` - Forecast endpoint
//!   (default: <https://api.openweathermap.org/data/2.5/forecast>)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_GOOGLE_PHOTOS_API_URL: &str = "https://photoslibrary.googleapis.com";
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Document store backend and client tuning
    pub store: StoreConfig,
    /// Google Photos configuration (optional, enables album creation)
    pub google: Option<GooglePhotosConfig>,
    /// Forecast service configuration
    pub weather: WeatherConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// Emit flattened JSON logs instead of text
    pub json_logs: bool,
}

/// Where documents are stored.
#[derive(Clone)]
pub enum StoreBackend {
    /// `PostgreSQL` JSONB table.
    Postgres { database_url: SecretString },
    /// Process memory; contents are lost on restart.
    Memory,
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"[REDACTED]")
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Document store client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Maximum number of cached listings
    pub cache_capacity: u64,
    /// How long a cached listing stays valid
    pub cache_ttl: Duration,
    /// Upper bound on every store call
    pub call_timeout: Duration,
}

impl StoreConfig {
    /// In-memory store with default tuning.
    #[must_use]
    pub const fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            cache_capacity: 1000,
            cache_ttl: Duration::from_secs(5),
            call_timeout: Duration::from_secs(10),
        }
    }

    /// Load store settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend is unknown, the database URL is
    /// missing for Postgres, or a tuning value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match get_env_or_default("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: get_database_url("FLORIST_DATABASE_URL")?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STORE_BACKEND".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            backend,
            cache_capacity: parse_env("STORE_CACHE_CAPACITY", "1000")?,
            cache_ttl: Duration::from_secs(parse_env("STORE_CACHE_TTL_SECS", "5")?),
            call_timeout: Duration::from_secs(parse_env("STORE_CALL_TIMEOUT_SECS", "10")?),
        })
    }
}

/// Google Photos Library API configuration.
///
/// Implements `Debug` manually to redact the OAuth secrets.
#[derive(Clone)]
pub struct GooglePhotosConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Refresh token exchanged for a short-lived access token per request
    pub refresh_token: SecretString,
    /// OAuth token endpoint
    pub token_url: Url,
    /// Library API base URL
    pub api_url: Url,
}

impl std::fmt::Debug for GooglePhotosConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GooglePhotosConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_url", &self.token_url.as_str())
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

impl GooglePhotosConfig {
    /// Load Google Photos configuration from environment.
    ///
    /// Returns `None` unless all three credentials are set; a partial set is
    /// logged and treated as unconfigured.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let client_id = get_optional_env("GOOGLE_CLIENT_ID");
        let client_secret = get_optional_env("GOOGLE_CLIENT_SECRET");
        let refresh_token = get_optional_env("GOOGLE_REFRESH_TOKEN");

        let credentials = (client_id, client_secret, refresh_token);
        let (client_id, client_secret, refresh_token) = match credentials {
            (Some(id), Some(secret), Some(token)) => (id, secret, token),
            (None, None, None) => return Ok(None),
            _ => {
                tracing::warn!(
                    "GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REFRESH_TOKEN must be set \
                     together; album creation disabled"
                );
                return Ok(None);
            }
        };

        if let Err(e) = validate_secret_strength(&client_secret, "GOOGLE_CLIENT_SECRET") {
            tracing::warn!("GOOGLE_CLIENT_SECRET validation warning: {e}");
        }

        Ok(Some(Self {
            client_id,
            client_secret: SecretString::from(client_secret),
            refresh_token: SecretString::from(refresh_token),
            token_url: get_url("GOOGLE_TOKEN_URL", DEFAULT_GOOGLE_TOKEN_URL)?,
            api_url: get_url("GOOGLE_PHOTOS_API_URL", DEFAULT_GOOGLE_PHOTOS_API_URL)?,
        }))
    }
}

/// Forecast service configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct WeatherConfig {
    /// `OpenWeatherMap` API key; requests fail with a fixed message when unset
    pub api_key: Option<SecretString>,
    /// Forecast endpoint
    pub api_url: Url,
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

impl WeatherConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_optional_env("WEATHER_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            api_url: get_url("WEATHER_API_URL", DEFAULT_WEATHER_API_URL)?,
        })
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env::<IpAddr>("FLORIST_HOST", "127.0.0.1")?;
        let port = parse_env::<u16>("FLORIST_PORT", "3001")?;
        let store = StoreConfig::from_env()?;
        let google = GooglePhotosConfig::from_env()?;
        let weather = WeatherConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let json_logs =
            get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        Ok(Self {
            host,
            port,
            store,
            google,
            weather,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            json_logs,
        })
    }

    /// Configuration for tests and local runs: in-memory store, no external
    /// services, ephemeral port.
    #[must_use]
    pub fn local() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            store: StoreConfig::memory(),
            google: None,
            weather: WeatherConfig {
                api_key: None,
                api_url: default_url(DEFAULT_WEATHER_API_URL),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            json_logs: false,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns a reference to the Google Photos configuration (if configured).
    #[must_use]
    pub const fn google(&self) -> Option<&GooglePhotosConfig> {
        self.google.as_ref()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a URL-valued environment variable, using `default` when unset.
fn get_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    let url = parse_env::<Url>(key, default)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn default_url(raw: &str) -> Url {
    Url::parse(raw).unwrap_or_else(|_| unreachable!("built-in URL {raw} is valid"))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-client-secret", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("GOCSPX-aB3xY9mK2nL5pQ7rT0uW4zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u16>("PORT", " 8080 ").unwrap(), 8080);
        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PORT"));
    }

    #[test]
    fn test_default_urls_are_valid() {
        for raw in [
            DEFAULT_GOOGLE_TOKEN_URL,
            DEFAULT_GOOGLE_PHOTOS_API_URL,
            DEFAULT_WEATHER_API_URL,
        ] {
            assert!(Url::parse(raw).is_ok(), "{raw}");
        }
    }

    #[test]
    fn test_socket_addr() {
        let mut config = AdminConfig::local();
        config.port = 3001;
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_google_config_debug_redacts_secrets() {
        let config = GooglePhotosConfig {
            client_id: "1234.apps.googleusercontent.com".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
            refresh_token: SecretString::from("1//refresh-token-value"),
            token_url: default_url(DEFAULT_GOOGLE_TOKEN_URL),
            api_url: default_url(DEFAULT_GOOGLE_PHOTOS_API_URL),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("1234.apps.googleusercontent.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
        assert!(!debug_output.contains("refresh-token-value"));
    }

    #[test]
    fn test_store_backend_debug_redacts_url() {
        let backend = StoreBackend::Postgres {
            database_url: SecretString::from("postgres://florist:hunter2@db/florist"),
        };
        let debug_output = format!("{backend:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_weather_config_debug_redacts_key() {
        let config = WeatherConfig {
            api_key: Some(SecretString::from("0123456789abcdef")),
            api_url: default_url(DEFAULT_WEATHER_API_URL),
        };
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("0123456789abcdef"));
        assert!(debug_output.contains("openweathermap"));
    }
}
