//! Identity provider client: authorization URLs, code exchange, refresh.

use secrecy::ExposeSecret;
use serde::Deserialize;
use time::OffsetDateTime;
use url::Url;

use super::OAuthState;
use crate::config::ProviderConfig;

/// Applied when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider rejected {operation}: status {status}: {detail}")]
    Rejected {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[error("state encoding error: {0}")]
    State(#[from] serde_json::Error),
}

/// Raw token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Tokens with an absolute expiry, ready to persist into the session.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at: i64,
}

pub struct OAuthClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl OAuthClient {
    #[must_use]
    pub fn new(config: ProviderConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Build the provider authorize URL carrying the serialized state.
    ///
    /// # Errors
    /// Returns an error if the state cannot be encoded.
    pub fn authorization_url(&self, state: &OAuthState) -> Result<Url, OAuthError> {
        let scope = self.config.scopes.join(" ");
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &scope)
            .append_pair("state", &state.encode()?);
        Ok(url)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    /// Returns [`OAuthError::Http`] on network failure or
    /// [`OAuthError::Rejected`] if the provider declines the code.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
        ];
        self.request_token("code exchange", &params).await
    }

    /// Trade a refresh token for a fresh token set. When the provider does
    /// not rotate the refresh token, the supplied one is carried over.
    ///
    /// # Errors
    /// Returns [`OAuthError::Http`] on network failure or
    /// [`OAuthError::Rejected`] if the provider declines the refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OAuthError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
        ];
        let mut tokens = self.request_token("token refresh", &params).await?;
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(refresh_token.to_string());
        }
        Ok(tokens)
    }

    async fn request_token(
        &self,
        operation: &'static str,
        params: &[(&str, &str)],
    ) -> Result<TokenSet, OAuthError> {
        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(OAuthError::Rejected {
                operation,
                status,
                detail,
            });
        }

        let body = response.json::<TokenEndpointResponse>().await?;
        let lifetime = body.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Ok(TokenSet {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_at: OffsetDateTime::now_utc().unix_timestamp() + lifetime,
        })
    }
}
