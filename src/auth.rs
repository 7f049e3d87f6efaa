use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::TokenSet;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

/// Fields of the token endpoint response this crate relies on.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Trades a refresh token for a fresh access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenManager {
    client: reqwest::Client,
    token_url: Url,
}

impl TokenManager {
    pub fn new(client: reqwest::Client, token_url: &str) -> AppResult<Self> {
        Ok(Self {
            client,
            token_url: Url::parse(token_url)?,
        })
    }

    /// Exchanges `config.refresh_token` at the OAuth token endpoint.
    ///
    /// Uses HTTP Basic auth with the client credentials and a
    /// `grant_type=refresh_token` form body. Makes exactly one request; retries
    /// are left to whoever schedules the run.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the request cannot be sent, the endpoint answers
    /// with a non-success status, or the body lacks `access_token` or
    /// `refresh_token`.
    pub async fn renew(&self, config: &Config) -> AppResult<TokenSet> {
        let endpoint = self.token_url.as_str();
        debug!(endpoint = endpoint, "Requesting token renewal");

        let response = self
            .client
            .post(self.token_url.clone())
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", config.refresh_token.as_str()),
                ("scope", config.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::AuthError(format!("Token request to {endpoint} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AuthError(format!(
                "HTTP {}: token endpoint {endpoint} rejected the refresh token: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            AppError::AuthError(format!("Malformed token response from {endpoint}: {e}"))
        })?;

        match (body.access_token, body.refresh_token) {
            (Some(access_token), Some(refresh_token))
                if !access_token.is_empty() && !refresh_token.is_empty() =>
            {
                info!("Access token renewed");
                Ok(TokenSet {
                    access_token,
                    refresh_token,
                })
            }
            _ => Err(AppError::AuthError(format!(
                "Malformed token response from {endpoint}: access_token or refresh_token missing"
            ))),
        }
    }
}
