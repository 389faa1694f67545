pub mod auth;
pub mod health;
pub mod onboarding;
pub mod proxy;

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};
use regex::Regex;
use url::Url;

use crate::error::GatewayError;

/// 302 Found, the status the identity provider round-trip expects.
pub(crate) fn found(location: &str) -> Response {
    match location.parse() {
        Ok(value) => {
            let mut response = StatusCode::FOUND.into_response();
            response.headers_mut().insert(LOCATION, value);
            response
        }
        // A location that is not a valid header value is an internal bug.
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Append path segments to a base URL, keeping its existing path intact.
/// `Url::join` would drop the last segment of a base without a trailing
/// slash.
pub(crate) fn append_segments(base: &Url, segments: &[&str]) -> Result<Url, GatewayError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| GatewayError::Internal(anyhow::anyhow!("Cannot extend URL path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// ISO 3166-1 alpha-2 country code.
pub(crate) fn valid_account_country(country: &str) -> bool {
    Regex::new(r"^[A-Z]{2}$").map_or(false, |re| re.is_match(country))
}
