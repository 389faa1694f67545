//! Encrypted, tamper-evident client-held session.
//!
//! The session cookie is the only persistence layer: it is encrypted and
//! authenticated by the private cookie jar, so the server keeps no session
//! table and any node can service any request. A cookie that fails to
//! decrypt or parse loads as the empty session, never as an error.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::error;

pub const SESSION_COOKIE_NAME: &str = "guichet_session";

/// Cookie lifetime once tokens are stored.
pub const AUTHENTICATED_MAX_AGE: Duration = Duration::days(90);

/// Cookie lifetime while an authorization round-trip is pending.
pub const PENDING_MAX_AGE: Duration = Duration::minutes(5);

/// Per-connection session record, opaque to the server between requests.
///
/// `state` is present iff an authorization redirect was issued and not yet
/// completed. `access_token` and `refresh_token` travel together: both
/// present after a successful token exchange, both absent otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix seconds; in the future whenever `access_token` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Single-use correlation nonce for the in-flight authorization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl SessionRecord {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Reads and writes the session cookie through an AEAD private jar.
#[derive(Clone)]
pub struct SessionStore {
    key: Key,
    domain: Option<String>,
    secure: bool,
}

impl SessionStore {
    #[must_use]
    pub fn new(key: Key, domain: Option<String>, secure: bool) -> Self {
        Self {
            key,
            domain,
            secure,
        }
    }

    /// Build a private jar from the request headers.
    #[must_use]
    pub fn jar(&self, headers: &HeaderMap) -> PrivateCookieJar {
        PrivateCookieJar::from_headers(headers, self.key.clone())
    }

    /// Decode the session from the jar. Missing, forged, or corrupted
    /// cookies yield the default (empty) record.
    #[must_use]
    pub fn load(jar: &PrivateCookieJar) -> SessionRecord {
        jar.get(SESSION_COOKIE_NAME)
            .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
            .unwrap_or_default()
    }

    /// Write the record back with the given max-age, re-applying cookie
    /// attributes.
    #[must_use]
    pub fn persist(
        &self,
        jar: PrivateCookieJar,
        record: &SessionRecord,
        max_age: Duration,
    ) -> PrivateCookieJar {
        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(err) => {
                error!(error = %err, "Failed to encode session record");
                return self.clear(jar);
            }
        };

        let mut cookie = Cookie::build((SESSION_COOKIE_NAME, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(max_age);
        if let Some(domain) = &self.domain {
            cookie = cookie.domain(domain.clone());
        }

        jar.add(cookie.build())
    }

    /// Invalidate the client session immediately; subsequent requests
    /// behave as unauthenticated.
    #[must_use]
    pub fn clear(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        let mut removal = Cookie::build((SESSION_COOKIE_NAME, "")).path("/");
        if let Some(domain) = &self.domain {
            removal = removal.domain(domain.clone());
        }
        jar.remove(removal.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn store() -> SessionStore {
        SessionStore::new(Key::from(&[7u8; 64]), None, true)
    }

    fn record_with_tokens() -> SessionRecord {
        SessionRecord {
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(1_900_000_000),
            state: None,
        }
    }

    #[test]
    fn test_round_trip() {
        let store = store();
        let jar = store.jar(&HeaderMap::new());
        let jar = store.persist(jar, &record_with_tokens(), AUTHENTICATED_MAX_AGE);

        // The jar decrypts its own cookie transparently.
        assert_eq!(SessionStore::load(&jar), record_with_tokens());
    }

    #[test]
    fn test_missing_cookie_is_empty_session() {
        let store = store();
        let jar = store.jar(&HeaderMap::new());
        assert_eq!(SessionStore::load(&jar), SessionRecord::default());
    }

    #[test]
    fn test_forged_cookie_is_empty_session() {
        let store = store();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!("{SESSION_COOKIE_NAME}=definitely-not-encrypted")
                .parse()
                .unwrap(),
        );
        let jar = store.jar(&headers);
        assert_eq!(SessionStore::load(&jar), SessionRecord::default());
    }

    #[test]
    fn test_wrong_key_is_empty_session() {
        use axum::http::header::SET_COOKIE;
        use axum::response::IntoResponse;

        let store = store();
        let jar = store.jar(&HeaderMap::new());
        let jar = store.persist(jar, &record_with_tokens(), AUTHENTICATED_MAX_AGE);

        // Round-trip through response headers to obtain the encrypted value.
        let response = (jar, "").into_response();
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        let pair = set_cookie.split(';').next().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, pair.parse().unwrap());

        // Same key decodes; a different key must not.
        assert_eq!(
            SessionStore::load(&store.jar(&headers)),
            record_with_tokens()
        );
        let other = SessionStore::new(Key::from(&[8u8; 64]), None, true);
        assert_eq!(
            SessionStore::load(&other.jar(&headers)),
            SessionRecord::default()
        );
    }

    #[test]
    fn test_cookie_attributes() {
        let store = SessionStore::new(Key::from(&[7u8; 64]), Some("bank.example".to_string()), true);
        let jar = store.jar(&HeaderMap::new());
        let jar = store.persist(jar, &record_with_tokens(), PENDING_MAX_AGE);
        let cookie = jar.get(SESSION_COOKIE_NAME).unwrap();

        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(PENDING_MAX_AGE));
        assert_eq!(cookie.domain(), Some("bank.example"));
    }

    #[test]
    fn test_clear_removes_session() {
        let store = store();
        let jar = store.jar(&HeaderMap::new());
        let jar = store.persist(jar, &record_with_tokens(), AUTHENTICATED_MAX_AGE);
        let jar = store.clear(jar);
        assert_eq!(SessionStore::load(&jar), SessionRecord::default());
    }

    #[test]
    fn test_state_only_record_round_trip() {
        let store = store();
        let record = SessionRecord {
            state: Some("01J0QNONCE".to_string()),
            ..SessionRecord::default()
        };
        let jar = store.persist(store.jar(&HeaderMap::new()), &record, PENDING_MAX_AGE);
        assert_eq!(SessionStore::load(&jar), record);
    }
}
