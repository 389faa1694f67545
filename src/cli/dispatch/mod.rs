//! Command-line argument dispatch and server initialization.
//!
//! This module maps validated CLI arguments to the appropriate action, such
//! as starting the gateway server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{oauth, session, upstream};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let external_url = matches
        .get_one::<String>("external-url")
        .cloned()
        .context("missing required argument: --external-url")?;

    let oauth_opts = oauth::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches)?;
    let upstream_opts = upstream::Options::parse(matches)?;

    Ok(Action::Server(Box::new(Args {
        port,
        external_url,
        oauth_client_id: oauth_opts.client_id,
        oauth_client_secret: oauth_opts.client_secret,
        oauth_authorize_url: oauth_opts.authorize_url,
        oauth_token_url: oauth_opts.token_url,
        oauth_scopes: oauth_opts.scopes,
        cookie_key: session_opts.cookie_key,
        cookie_domain: session_opts.cookie_domain,
        insecure_cookies: session_opts.insecure_cookies,
        unauthenticated_api_url: upstream_opts.unauthenticated_api_url,
        partner_api_url: upstream_opts.partner_api_url,
        onboarding_url: upstream_opts.onboarding_url,
        banking_url: upstream_opts.banking_url,
    })))
}
