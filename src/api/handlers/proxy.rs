//! Reverse proxy onto the banking APIs with bearer injection.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::api::GatewayState;
use crate::error::GatewayError;
use crate::middleware::CurrentToken;

/// Request bodies are buffered before forwarding; GraphQL payloads stay small.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Plain passthrough to the public API; no credential is attached even
/// when a session exists.
#[utoipa::path(
    post,
    path = "/api/unauthenticated",
    responses(
        (status = 200, description = "Upstream response, streamed through"),
        (status = 502, description = "Upstream unreachable")
    ),
    tag = "proxy"
)]
pub async fn unauthenticated(
    State(state): State<Arc<GatewayState>>,
    request: Request,
) -> Result<Response, GatewayError> {
    let url = state.config.upstream.unauthenticated_api_url.clone();
    forward(&state, url, request, None).await
}

/// Forward to the partner API. A session token is mandatory here; without
/// one the request never leaves the gateway.
#[utoipa::path(
    post,
    path = "/api/partner",
    responses(
        (status = 200, description = "Upstream response, streamed through"),
        (status = 401, description = "No session token"),
        (status = 502, description = "Upstream unreachable")
    ),
    tag = "proxy"
)]
pub async fn partner(
    State(state): State<Arc<GatewayState>>,
    request: Request,
) -> Result<Response, GatewayError> {
    let token = request
        .extensions()
        .get::<CurrentToken>()
        .and_then(|t| t.0.clone())
        .ok_or(GatewayError::MissingAccessToken)?;

    let url = state.config.upstream.partner_api_url.clone();
    forward(&state, url, request, Some(token)).await
}

async fn forward(
    state: &GatewayState,
    url: url::Url,
    request: Request,
    token: Option<String>,
) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| GatewayError::Internal(anyhow::anyhow!(e)))?;

    let mut upstream = state
        .http
        .request(parts.method, url.as_str())
        .headers(sanitized_headers(&parts.headers))
        .body(body);

    if let Some(token) = token {
        upstream = upstream.bearer_auth(token);
    }

    let upstream_response = upstream.send().await.map_err(GatewayError::Upstream)?;

    debug!(status = %upstream_response.status(), url = %url, "Upstream responded");

    let mut response = Response::builder().status(upstream_response.status());
    for (name, value) in upstream_response.headers() {
        if !is_hop_by_hop(name) {
            response = response.header(name, value);
        }
    }

    response
        .body(Body::from_stream(upstream_response.bytes_stream()))
        .map_err(|e| GatewayError::Internal(e.into()))
}

/// Strip headers that must not cross the proxy boundary. Cookies stay on
/// this side; authorization is replaced by the injected bearer.
fn sanitized_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in headers {
        if name == header::HOST
            || name == header::COOKIE
            || name == header::AUTHORIZATION
            || name == header::CONTENT_LENGTH
            || is_hop_by_hop(name)
        {
            continue;
        }
        forwarded.append(name, value.clone());
    }
    forwarded
}

fn is_hop_by_hop(name: &header::HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}
