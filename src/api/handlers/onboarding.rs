//! Onboarding entry points: start an account-holder onboarding and hand
//! the browser to the onboarding application.

use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{append_segments, found, valid_account_country};
use crate::api::GatewayState;
use crate::error::GatewayError;
use crate::onboarding::StartedOnboarding;

/// Country used when the caller does not pick one.
const DEFAULT_ACCOUNT_COUNTRY: &str = "FR";

#[derive(Debug, Deserialize)]
pub struct StartParams {
    #[serde(rename = "accountCountry")]
    account_country: Option<String>,
}

/// Start an individual account-holder onboarding.
#[utoipa::path(
    get,
    path = "/onboarding/individual/start",
    responses(
        (status = 302, description = "Redirect to the onboarding application"),
        (status = 400, description = "Invalid accountCountry or upstream rejection")
    ),
    tag = "onboarding"
)]
pub async fn start_individual(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<StartParams>,
) -> Result<Response, GatewayError> {
    let country = account_country(params.account_country)?;
    let started = state
        .bridge
        .onboard_individual(&country)
        .await
        .map_err(GatewayError::OnboardingStart)?;

    info!(onboarding_id = %started.onboarding_id, country, "Started individual onboarding");

    redirect_to_onboarding(&state, &started)
}

/// Start a company account-holder onboarding.
#[utoipa::path(
    get,
    path = "/onboarding/company/start",
    responses(
        (status = 302, description = "Redirect to the onboarding application"),
        (status = 400, description = "Invalid accountCountry or upstream rejection")
    ),
    tag = "onboarding"
)]
pub async fn start_company(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<StartParams>,
) -> Result<Response, GatewayError> {
    let country = account_country(params.account_country)?;
    let started = state
        .bridge
        .onboard_company(&country)
        .await
        .map_err(GatewayError::OnboardingStart)?;

    info!(onboarding_id = %started.onboarding_id, country, "Started company onboarding");

    redirect_to_onboarding(&state, &started)
}

fn account_country(requested: Option<String>) -> Result<String, GatewayError> {
    match requested {
        None => Ok(DEFAULT_ACCOUNT_COUNTRY.to_string()),
        Some(country) if valid_account_country(&country) => Ok(country),
        Some(country) => Err(GatewayError::InvalidAccountCountry(country)),
    }
}

/// Prefer the upstream-provided URL; fall back to composing one from the
/// configured onboarding application.
fn redirect_to_onboarding(
    state: &GatewayState,
    started: &StartedOnboarding,
) -> Result<Response, GatewayError> {
    if let Some(url) = &started.onboarding_url {
        return Ok(found(url));
    }

    let url = append_segments(
        &state.config.upstream.onboarding_url,
        &["onboardings", &started.onboarding_id],
    )?;
    Ok(found(url.as_str()))
}
