//! OAuth2 client-credentials token management

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use log::debug;
use reqwest::Url;
use secrecy::ExposeSecret;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::models::{CredentialSet, TokenInfo, TokenResponse};

/// Seconds of headroom before expiry at which a cached token is refreshed
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint does not report `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Acquires and caches bearer tokens for one tenant
pub struct AuthManager {
    http: reqwest::Client,
    token_url: Url,
    credentials: CredentialSet,
    cached: Mutex<Option<TokenInfo>>,
}

impl AuthManager {
    /// `base_url` must end with a slash; the token endpoint is `{base}oidc/token`
    pub fn new(http: reqwest::Client, base_url: &Url, credentials: CredentialSet) -> Result<Self> {
        let token_url = base_url
            .join("oidc/token")
            .with_context(|| format!("Invalid token URL for {}", base_url))?;

        Ok(Self {
            http,
            token_url,
            credentials,
            cached: Mutex::new(None),
        })
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Return a valid access token, requesting a new one if needed
    pub async fn bearer_token(&self, cancel: &CancellationToken) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_valid(TOKEN_REFRESH_MARGIN_SECS) {
                return Ok(token.access_token.clone());
            }
            debug!("Cached token for {} expired, refreshing", self.token_url);
        }

        let token = tokio::select! {
            _ = cancel.cancelled() => anyhow::bail!("Token request to {} cancelled", self.token_url),
            token = self.request_token() => token?,
        };

        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn request_token(&self) -> Result<TokenInfo> {
        debug!(
            "Requesting client-credentials token from {} for client {}",
            self.token_url, self.credentials.client_id
        );

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.expose_secret()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to reach token endpoint {}", self.token_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Token request to {} failed with {}: {}",
                self.token_url,
                status,
                body.trim()
            );
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Ok(TokenInfo {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }
}
