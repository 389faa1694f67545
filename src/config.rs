//! Immutable gateway configuration, constructed once at process start and
//! passed explicitly into each component constructor.

use anyhow::{anyhow, Context, Result};
use axum_extra::extract::cookie::Key;
use base64ct::{Base64, Encoding};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Identity provider settings for the Authorization-Code flow.
#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub authorize_url: Url,
    pub token_url: Url,
    /// Redirect URI registered with the provider; always
    /// `{external_url}/auth/callback`.
    pub redirect_uri: Url,
    pub scopes: Vec<String>,
}

/// Upstream APIs and applications the gateway fronts.
#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub unauthenticated_api_url: Url,
    pub partner_api_url: Url,
    pub onboarding_url: Url,
    pub banking_url: Url,
}

#[derive(Clone)]
pub struct GatewayConfig {
    external_url: Url,
    pub provider: ProviderConfig,
    pub upstream: UpstreamConfig,
    cookie_key: Key,
    cookie_domain: Option<String>,
    insecure_cookies: bool,
}

impl GatewayConfig {
    /// Build the configuration from raw CLI values.
    ///
    /// # Errors
    /// Returns an error if any URL is invalid or the cookie key cannot be
    /// decoded into 64 bytes of base64.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        external_url: &str,
        client_id: String,
        client_secret: SecretString,
        authorize_url: &str,
        token_url: &str,
        scopes: Vec<String>,
        cookie_key: &SecretString,
        cookie_domain: Option<String>,
        unauthenticated_api_url: &str,
        partner_api_url: &str,
        onboarding_url: &str,
        banking_url: &str,
        insecure_cookies: bool,
    ) -> Result<Self> {
        let external_url = parse_url("external-url", external_url)?;
        let redirect_uri = external_url
            .join("/auth/callback")
            .context("Failed to build the OAuth2 redirect URI")?;

        let provider = ProviderConfig {
            client_id,
            client_secret,
            authorize_url: parse_url("oauth-authorize-url", authorize_url)?,
            token_url: parse_url("oauth-token-url", token_url)?,
            redirect_uri,
            scopes,
        };

        let upstream = UpstreamConfig {
            unauthenticated_api_url: parse_url("unauthenticated-api-url", unauthenticated_api_url)?,
            partner_api_url: parse_url("partner-api-url", partner_api_url)?,
            onboarding_url: parse_url("onboarding-url", onboarding_url)?,
            banking_url: parse_url("banking-url", banking_url)?,
        };

        Ok(Self {
            external_url,
            provider,
            upstream,
            cookie_key: decode_cookie_key(cookie_key)?,
            cookie_domain,
            insecure_cookies,
        })
    }

    #[must_use]
    pub fn external_url(&self) -> &Url {
        &self.external_url
    }

    #[must_use]
    pub fn cookie_key(&self) -> &Key {
        &self.cookie_key
    }

    #[must_use]
    pub fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }

    /// The session cookie is `Secure` unless explicitly disabled for local
    /// development over plain HTTP.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        !self.insecure_cookies
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("external_url", &self.external_url.as_str())
            .field("client_id", &self.provider.client_id)
            .field("client_secret", &"***")
            .field("authorize_url", &self.provider.authorize_url.as_str())
            .field("token_url", &self.provider.token_url.as_str())
            .field("scopes", &self.provider.scopes)
            .field("upstream", &self.upstream)
            .field("cookie_key", &"***")
            .field("cookie_domain", &self.cookie_domain)
            .field("insecure_cookies", &self.insecure_cookies)
            .finish()
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("Invalid URL for --{name}: {value}"))
}

/// The cookie key is base64 over exactly 64 random bytes; anything shorter
/// cannot key the AEAD cookie jar.
fn decode_cookie_key(key: &SecretString) -> Result<Key> {
    let bytes = Base64::decode_vec(key.expose_secret())
        .map_err(|e| anyhow!("Cookie key is not valid base64: {e}"))?;

    if bytes.len() < 64 {
        return Err(anyhow!(
            "Cookie key must decode to at least 64 bytes, got {}",
            bytes.len()
        ));
    }

    Key::try_from(&bytes[..64]).map_err(|e| anyhow!("Invalid cookie key: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_cookie_key() -> SecretString {
        SecretString::from(Base64::encode_string(&[7u8; 64]))
    }

    fn build(external_url: &str, cookie_key: &SecretString) -> Result<GatewayConfig> {
        build_with_insecure(external_url, cookie_key, false)
    }

    fn build_with_insecure(
        external_url: &str,
        cookie_key: &SecretString,
        insecure_cookies: bool,
    ) -> Result<GatewayConfig> {
        GatewayConfig::new(
            external_url,
            "client-id".to_string(),
            SecretString::from("client-secret"),
            "https://idp.example.com/oauth/authorize",
            "https://idp.example.com/oauth/token",
            vec!["openid".to_string()],
            cookie_key,
            None,
            "https://api.example.com/unauthenticated",
            "https://api.example.com/partner",
            "https://onboarding.example.com",
            "https://banking.example.com",
            insecure_cookies,
        )
    }

    #[test]
    fn test_redirect_uri_derived_from_external_url() {
        let config = build("https://gateway.example.com", &test_cookie_key()).unwrap();
        assert_eq!(
            config.provider.redirect_uri.as_str(),
            "https://gateway.example.com/auth/callback"
        );
        assert!(config.cookie_secure());
    }

    #[test]
    fn test_secure_cookies_regardless_of_scheme() {
        // Plain HTTP does not weaken the cookie; only the explicit flag does.
        let config = build("http://localhost:8080", &test_cookie_key()).unwrap();
        assert!(config.cookie_secure());
    }

    #[test]
    fn test_insecure_cookies_flag_drops_secure() {
        let config =
            build_with_insecure("http://localhost:8080", &test_cookie_key(), true).unwrap();
        assert!(!config.cookie_secure());
    }

    #[test]
    fn test_rejects_short_cookie_key() {
        let short = SecretString::from(Base64::encode_string(&[7u8; 16]));
        assert!(build("https://gateway.example.com", &short).is_err());
    }

    #[test]
    fn test_rejects_non_base64_cookie_key() {
        let bad = SecretString::from("not base64 at all!");
        assert!(build("https://gateway.example.com", &bad).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = build("https://gateway.example.com", &test_cookie_key()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("client-secret"));
        assert!(debug.contains("***"));
    }
}
