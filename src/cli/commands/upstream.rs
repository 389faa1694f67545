//! Upstream API and application URLs.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_UNAUTHENTICATED_API_URL: &str = "unauthenticated-api-url";
pub const ARG_PARTNER_API_URL: &str = "partner-api-url";
pub const ARG_ONBOARDING_URL: &str = "onboarding-url";
pub const ARG_BANKING_URL: &str = "banking-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_UNAUTHENTICATED_API_URL)
                .long(ARG_UNAUTHENTICATED_API_URL)
                .help("Public upstream API endpoint (no credential required)")
                .env("GUICHET_UNAUTHENTICATED_API_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PARTNER_API_URL)
                .long(ARG_PARTNER_API_URL)
                .help("Authenticated upstream API endpoint (bearer token injected)")
                .env("GUICHET_PARTNER_API_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_ONBOARDING_URL)
                .long(ARG_ONBOARDING_URL)
                .help("Base URL of the onboarding application")
                .env("GUICHET_ONBOARDING_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_BANKING_URL)
                .long(ARG_BANKING_URL)
                .help("Base URL of the authenticated banking application")
                .env("GUICHET_BANKING_URL")
                .required(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub unauthenticated_api_url: String,
    pub partner_api_url: String,
    pub onboarding_url: String,
    pub banking_url: String,
}

impl Options {
    /// Collect upstream options from validated matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let get = |name: &str| {
            matches
                .get_one::<String>(name)
                .cloned()
                .with_context(|| format!("missing required argument: --{name}"))
        };

        Ok(Self {
            unauthenticated_api_url: get(ARG_UNAUTHENTICATED_API_URL)?,
            partner_api_url: get(ARG_PARTNER_API_URL)?,
            onboarding_url: get(ARG_ONBOARDING_URL)?,
            banking_url: get(ARG_BANKING_URL)?,
        })
    }
}
