//! Gateway error taxonomy.
//!
//! Authentication and session errors are resolved at the gateway boundary
//! with a specific status; only unexpected failures fall through to the
//! generic 500 handler.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::oauth::client::OAuthError;
use crate::onboarding::BridgeError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// `redirectTo` must stay on this origin; absolute URLs are open redirects.
    #[error("redirect target must be a relative path")]
    InvalidRedirect,

    /// Callback state does not correlate with the session nonce.
    #[error("authorization state mismatch")]
    StateMismatch,

    /// The identity provider reported an error instead of a code.
    #[error("identity provider error: {error}")]
    Provider {
        error: String,
        description: Option<String>,
    },

    #[error("token exchange rejected")]
    TokenExchange(#[source] OAuthError),

    #[error("missing access token")]
    MissingAccessToken,

    /// `accountCountry` must be an ISO 3166-1 alpha-2 code.
    #[error("invalid account country: {0}")]
    InvalidAccountCountry(String),

    #[error("onboarding start failed")]
    OnboardingStart(#[source] BridgeError),

    #[error("onboarding finalize failed")]
    OnboardingFinalize(#[source] BridgeError),

    #[error("upstream request failed")]
    Upstream(#[source] reqwest::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidRedirect => {
                (StatusCode::FORBIDDEN, "Invalid redirect target").into_response()
            }
            Self::StateMismatch => {
                (StatusCode::BAD_REQUEST, "Invalid authorization state").into_response()
            }
            Self::Provider { error, description } => {
                let detail = description.unwrap_or_default();
                let body = format!(
                    "<!doctype html><html><body><h1>Authentication failed</h1>\
                     <p>{}</p><p>{}</p></body></html>",
                    escape_html(&error),
                    escape_html(&detail)
                );
                (StatusCode::BAD_REQUEST, Html(body)).into_response()
            }
            Self::TokenExchange(err) => {
                error!(error = %err, "Token exchange failed");
                (StatusCode::UNAUTHORIZED, "Token exchange failed").into_response()
            }
            Self::MissingAccessToken => {
                (StatusCode::UNAUTHORIZED, "Not authenticated").into_response()
            }
            Self::InvalidAccountCountry(country) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid account country: {}", escape_html(&country)),
            )
                .into_response(),
            Self::OnboardingStart(err) => {
                error!(error = %err, "Onboarding start failed");
                (StatusCode::BAD_REQUEST, "Onboarding could not be started").into_response()
            }
            Self::OnboardingFinalize(err) => {
                error!(error = %err, "Onboarding finalize failed");
                (StatusCode::BAD_REQUEST, "Onboarding could not be finalized").into_response()
            }
            Self::Upstream(err) => {
                error!(error = %err, "Upstream request failed");
                StatusCode::BAD_GATEWAY.into_response()
            }
            Self::Internal(err) => {
                error!(error = %err, "Unexpected gateway error");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"ok": false}))).into_response()
            }
        }
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
