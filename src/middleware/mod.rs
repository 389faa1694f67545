//! Ordered request interceptors composed before the router.
//!
//! 1. [`attach_token`] copies the stored access token onto the request
//!    context.
//! 2. [`refresh_guard`] refreshes a near-expiry token before any route
//!    handler runs, or short-circuits to `/login` when the refresh token is
//!    no longer accepted.

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::api::{handlers::found, GatewayState};
use crate::session::{SessionStore, AUTHENTICATED_MAX_AGE, SESSION_COOKIE_NAME};

/// Refresh when the access token expires within this window.
pub const REFRESH_WINDOW_SECS: i64 = 10;

/// Access token for the current request, populated by [`attach_token`] and
/// overwritten by [`refresh_guard`] after a successful refresh.
#[derive(Debug, Clone, Default)]
pub struct CurrentToken(pub Option<String>);

/// Copy the session's access token into the request extensions.
pub async fn attach_token(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = state.sessions.jar(request.headers());
    let record = SessionStore::load(&jar);
    request
        .extensions_mut()
        .insert(CurrentToken(record.access_token));
    next.run(request).await
}

/// Proactively refresh the access token when it is about to expire.
///
/// The request awaits the refresh so downstream handlers always observe a
/// valid token. Exactly one refresh is attempted per request; on rejection
/// the session is deleted and the response redirects to `/login`. Two
/// concurrent requests near expiry may both refresh; whichever cookie is
/// written last wins.
pub async fn refresh_guard(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = state.sessions.jar(request.headers());
    let mut record = SessionStore::load(&jar);

    let Some(refresh_token) = record.refresh_token.clone() else {
        return next.run(request).await;
    };

    let now = OffsetDateTime::now_utc().unix_timestamp();
    if record.expires_at.unwrap_or(0) >= now + REFRESH_WINDOW_SECS {
        return next.run(request).await;
    }

    match state.oauth.refresh(&refresh_token).await {
        Ok(tokens) => {
            debug!("Access token refreshed");
            record.access_token = Some(tokens.access_token.clone());
            record.refresh_token = tokens.refresh_token;
            record.expires_at = Some(tokens.expires_at);

            request
                .extensions_mut()
                .insert(CurrentToken(Some(tokens.access_token)));

            let jar = state
                .sessions
                .persist(jar, &record, AUTHENTICATED_MAX_AGE);
            let response = next.run(request).await;

            // A handler that rewrote the session (logout, callback) wins over
            // the refreshed cookie.
            if session_cookie_already_set(&response) {
                response
            } else {
                (jar, response).into_response()
            }
        }
        Err(err) => {
            warn!(error = %err, "Token refresh rejected; clearing session");
            let jar = state.sessions.clear(jar);
            (jar, found("/login")).into_response()
        }
    }
}

fn session_cookie_already_set(response: &Response) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(SESSION_COOKIE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_cookie_detection() {
        let mut response = Response::new(axum::body::Body::empty());
        assert!(!session_cookie_already_set(&response));

        response.headers_mut().append(
            SET_COOKIE,
            HeaderValue::from_static("other=1; Path=/"),
        );
        assert!(!session_cookie_already_set(&response));

        response.headers_mut().append(
            SET_COOKIE,
            HeaderValue::from_static("guichet_session=abc; Path=/"),
        );
        assert!(session_cookie_already_set(&response));
    }
}
