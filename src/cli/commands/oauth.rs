//! Identity provider arguments.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_OAUTH_CLIENT_ID: &str = "oauth-client-id";
pub const ARG_OAUTH_CLIENT_SECRET: &str = "oauth-client-secret";
pub const ARG_OAUTH_AUTHORIZE_URL: &str = "oauth-authorize-url";
pub const ARG_OAUTH_TOKEN_URL: &str = "oauth-token-url";
pub const ARG_OAUTH_SCOPES: &str = "oauth-scopes";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_OAUTH_CLIENT_ID)
                .long(ARG_OAUTH_CLIENT_ID)
                .help("OAuth2 client id registered with the identity provider")
                .env("GUICHET_OAUTH_CLIENT_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_OAUTH_CLIENT_SECRET)
                .long(ARG_OAUTH_CLIENT_SECRET)
                .help("OAuth2 client secret")
                .env("GUICHET_OAUTH_CLIENT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_OAUTH_AUTHORIZE_URL)
                .long(ARG_OAUTH_AUTHORIZE_URL)
                .help("Identity provider authorization endpoint")
                .env("GUICHET_OAUTH_AUTHORIZE_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_OAUTH_TOKEN_URL)
                .long(ARG_OAUTH_TOKEN_URL)
                .help("Identity provider token endpoint")
                .env("GUICHET_OAUTH_TOKEN_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_OAUTH_SCOPES)
                .long(ARG_OAUTH_SCOPES)
                .help("Space-separated OAuth2 scopes")
                .default_value("openid offline")
                .env("GUICHET_OAUTH_SCOPES"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub client_id: String,
    pub client_secret: SecretString,
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

impl Options {
    /// Collect provider options from validated matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            client_id: matches
                .get_one::<String>(ARG_OAUTH_CLIENT_ID)
                .cloned()
                .context("missing required argument: --oauth-client-id")?,
            client_secret: matches
                .get_one::<String>(ARG_OAUTH_CLIENT_SECRET)
                .cloned()
                .map(SecretString::from)
                .context("missing required argument: --oauth-client-secret")?,
            authorize_url: matches
                .get_one::<String>(ARG_OAUTH_AUTHORIZE_URL)
                .cloned()
                .context("missing required argument: --oauth-authorize-url")?,
            token_url: matches
                .get_one::<String>(ARG_OAUTH_TOKEN_URL)
                .cloned()
                .context("missing required argument: --oauth-token-url")?,
            scopes: matches
                .get_one::<String>(ARG_OAUTH_SCOPES)
                .map(|s| s.split_whitespace().map(ToString::to_string).collect())
                .unwrap_or_default(),
        })
    }
}
