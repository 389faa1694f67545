//! OAuth2 Authorization-Code flow endpoints: login, callback, logout.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::{append_segments, found};
use crate::api::GatewayState;
use crate::error::GatewayError;
use crate::oauth::OAuthState;
use crate::session::{SessionRecord, SessionStore, AUTHENTICATED_MAX_AGE, PENDING_MAX_AGE};

/// Where the popup flow lands when no explicit target was requested.
const DEFAULT_REDIRECT_TO: &str = "/swanpopupcallback";

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    #[serde(rename = "redirectTo")]
    redirect_to: Option<String>,
    #[serde(rename = "onboardingId")]
    onboarding_id: Option<String>,
    #[serde(rename = "accountMembershipId")]
    account_membership_id: Option<String>,
}

/// A redirect target is acceptable only when it stays on this origin.
/// `//host` and `/\host` are scheme-relative escapes, not paths.
fn is_relative_redirect(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}

/// Begin the authorization round-trip.
#[utoipa::path(
    get,
    path = "/auth/login",
    responses(
        (status = 302, description = "Redirect to the identity provider"),
        (status = 403, description = "redirectTo is not a relative path")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Query(params): Query<LoginParams>,
) -> Result<Response, GatewayError> {
    if let Some(target) = &params.redirect_to {
        if !is_relative_redirect(target) {
            warn!(target = %target, "Rejected non-relative redirect target");
            return Err(GatewayError::InvalidRedirect);
        }
    }

    let id = OAuthState::new_id();
    // Onboarding finalization outranks membership binding outranks a plain
    // redirect when several parameters arrive together.
    let oauth_state = match (params.onboarding_id, params.account_membership_id) {
        (Some(onboarding_id), _) => OAuthState::FinalizeOnboarding {
            id: id.clone(),
            onboarding_id,
        },
        (None, Some(account_membership_id)) => OAuthState::BindAccountMembership {
            id: id.clone(),
            account_membership_id,
        },
        (None, None) => OAuthState::Redirect {
            id: id.clone(),
            redirect_to: params.redirect_to,
        },
    };

    let authorize_url = state
        .oauth
        .authorization_url(&oauth_state)
        .map_err(|e| GatewayError::Internal(e.into()))?;

    let jar = state.sessions.jar(&headers);
    let mut record = SessionStore::load(&jar);
    record.state = Some(id);
    let jar = state.sessions.persist(jar, &record, PENDING_MAX_AGE);

    Ok((jar, found(authorize_url.as_str())).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// OAuth2 redirect target: validate state, exchange the code, dispatch.
#[utoipa::path(
    get,
    path = "/auth/callback",
    responses(
        (status = 302, description = "Authenticated; redirect per state variant"),
        (status = 400, description = "Invalid state, missing code, or provider error"),
        (status = 401, description = "Token exchange rejected")
    ),
    tag = "auth"
)]
pub async fn callback(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let jar = state.sessions.jar(&headers);
    let mut record = SessionStore::load(&jar);
    // The nonce is single-use: consumed here whatever the outcome.
    let pending_nonce = record.state.take();

    let outcome = run_callback(&state, &mut record, pending_nonce, params).await;

    let jar = if record.is_authenticated() {
        state
            .sessions
            .persist(jar, &record, AUTHENTICATED_MAX_AGE)
    } else {
        state.sessions.clear(jar)
    };

    match outcome {
        Ok(response) => (jar, response).into_response(),
        Err(err) => (jar, err).into_response(),
    }
}

async fn run_callback(
    state: &GatewayState,
    record: &mut SessionRecord,
    pending_nonce: Option<String>,
    params: CallbackParams,
) -> Result<Response, GatewayError> {
    if let Some(error) = params.error {
        warn!(error = %error, "Identity provider returned an error");
        return Err(GatewayError::Provider {
            error,
            description: params.error_description,
        });
    }

    let code = params.code.ok_or(GatewayError::StateMismatch)?;
    let oauth_state = params
        .state
        .as_deref()
        .and_then(OAuthState::decode)
        .ok_or(GatewayError::StateMismatch)?;

    // CSRF defense: the round-tripped id must match the session nonce. No
    // variant bypasses this check.
    if pending_nonce.as_deref() != Some(oauth_state.id()) {
        warn!("Authorization state does not match the session nonce");
        return Err(GatewayError::StateMismatch);
    }

    let tokens = state
        .oauth
        .exchange_code(&code)
        .await
        .map_err(GatewayError::TokenExchange)?;

    record.access_token = Some(tokens.access_token.clone());
    record.refresh_token = tokens.refresh_token.clone();
    record.expires_at = Some(tokens.expires_at);

    info!("Authorization code exchanged");

    Ok(match oauth_state {
        OAuthState::Redirect { redirect_to, .. } => {
            found(redirect_to.as_deref().unwrap_or(DEFAULT_REDIRECT_TO))
        }
        OAuthState::FinalizeOnboarding { onboarding_id, .. } => {
            let finalized = state
                .bridge
                .finalize(&onboarding_id, &tokens.access_token)
                .await
                .map_err(GatewayError::OnboardingFinalize)?;

            let mut url = state.config.upstream.onboarding_url.clone();
            url.query_pairs_mut()
                .append_pair("redirectUrl", &finalized.redirect_url)
                .append_pair("accountMembershipId", &finalized.account_membership_id);
            found(url.as_str())
        }
        OAuthState::BindAccountMembership {
            account_membership_id,
            ..
        } => {
            match state
                .bridge
                .bind_account_membership(&account_membership_id, &tokens.access_token)
                .await
            {
                Ok(membership_id) => {
                    let url =
                        append_segments(&state.config.upstream.banking_url, &[&membership_id])?;
                    found(url.as_str())
                }
                // Binding is recoverable in-app; degrade to the app root.
                Err(err) => {
                    warn!(error = %err, "Account membership binding failed");
                    found(state.config.upstream.banking_url.as_str())
                }
            }
        }
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Clear the session. Idempotent; reports whether a session existed.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session state after logout", body = LogoutResponse)
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    let jar = state.sessions.jar(&headers);
    let record = SessionStore::load(&jar);

    if !record.is_authenticated() {
        return Json(LogoutResponse { success: false }).into_response();
    }

    let jar = state.sessions.clear(jar);
    (jar, Json(LogoutResponse { success: true })).into_response()
}
