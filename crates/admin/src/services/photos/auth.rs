//! OAuth refresh-token exchange.
//!
//! The shop's Google account authorizes once; the resulting refresh token is
//! configured on the server and traded for an access token on every album
//! request.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::PhotosError;

/// Bearer token for the Library API.
#[derive(Debug, Clone)]
pub struct AccessToken {
    access_token: SecretString,
    /// Token lifetime in seconds, when reported.
    pub expires_in: Option<i64>,
}

impl AccessToken {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            expires_in: None,
        }
    }

    pub(crate) const fn secret(&self) -> &SecretString {
        &self.access_token
    }
}

/// Response from the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Error response from the token endpoint.
#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchange a refresh token for an access token.
///
/// # Errors
///
/// Returns `PhotosError::TokenExchange` with the endpoint's status if the
/// grant is refused, `PhotosError::Http` on transport failure.
#[instrument(skip(client, client_secret, refresh_token), fields(token_url = %token_url))]
pub async fn exchange_refresh_token(
    client: &reqwest::Client,
    token_url: &Url,
    client_id: &str,
    client_secret: &SecretString,
    refresh_token: &SecretString,
) -> Result<AccessToken, PhotosError> {
    let response = client
        .post(token_url.clone())
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?;

    let status = response.status();

    if status.is_success() {
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PhotosError::Parse(format!("Failed to parse token response: {e}")))?;

        return Ok(AccessToken {
            access_token: SecretString::from(token.access_token),
            expires_in: token.expires_in,
        });
    }

    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(PhotosError::TokenExchange {
        status: status.as_u16(),
        message: token_error_message(&text),
    })
}

/// Pull a readable message out of a token endpoint error body.
fn token_error_message(body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error_description: Some(description),
            ..
        }) => description,
        Ok(TokenErrorResponse {
            error: Some(error), ..
        }) => error,
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_message_prefers_description() {
        let body = r#"{
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        }"#;
        assert_eq!(token_error_message(body), "Token has been expired or revoked.");
    }

    #[test]
    fn test_token_error_message_falls_back() {
        assert_eq!(token_error_message(r#"{"error": "invalid_client"}"#), "invalid_client");
        assert_eq!(token_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("ya29.very-secret");
        assert!(!format!("{token:?}").contains("very-secret"));
    }
}
