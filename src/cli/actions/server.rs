//! Start the gateway server.

use crate::{api, config::GatewayConfig};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub external_url: String,
    pub oauth_client_id: String,
    pub oauth_client_secret: SecretString,
    pub oauth_authorize_url: String,
    pub oauth_token_url: String,
    pub oauth_scopes: Vec<String>,
    pub cookie_key: SecretString,
    pub cookie_domain: Option<String>,
    pub insecure_cookies: bool,
    pub unauthenticated_api_url: String,
    pub partner_api_url: String,
    pub onboarding_url: String,
    pub banking_url: String,
}

/// Build the immutable configuration and serve until shutdown.
///
/// # Errors
/// Returns an error if the configuration is invalid or the server fails
/// to bind.
pub async fn execute(args: Args) -> Result<()> {
    let config = GatewayConfig::new(
        &args.external_url,
        args.oauth_client_id,
        args.oauth_client_secret,
        &args.oauth_authorize_url,
        &args.oauth_token_url,
        args.oauth_scopes,
        &args.cookie_key,
        args.cookie_domain,
        &args.unauthenticated_api_url,
        &args.partner_api_url,
        &args.onboarding_url,
        &args.banking_url,
        args.insecure_cookies,
    )?;

    debug!(config = ?config, "Gateway configuration loaded");

    let state = api::GatewayState::from_config(config)?;

    api::new(args.port, Arc::new(state)).await
}
