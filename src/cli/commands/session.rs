//! Session cookie arguments.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_COOKIE_KEY: &str = "cookie-key";
pub const ARG_COOKIE_DOMAIN: &str = "cookie-domain";
pub const ARG_INSECURE_COOKIES: &str = "insecure-cookies";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_COOKIE_KEY)
                .long(ARG_COOKIE_KEY)
                .help("Secret used to derive the session cookie encryption key")
                .env("GUICHET_COOKIE_KEY")
                .required(true),
        )
        .arg(
            Arg::new(ARG_COOKIE_DOMAIN)
                .long(ARG_COOKIE_DOMAIN)
                .help("Domain attribute for the session cookie (host-only when omitted)")
                .env("GUICHET_COOKIE_DOMAIN"),
        )
        .arg(
            Arg::new(ARG_INSECURE_COOKIES)
                .long(ARG_INSECURE_COOKIES)
                .help("Drop the Secure cookie attribute, for local development over plain HTTP")
                .env("GUICHET_INSECURE_COOKIES")
                .action(clap::ArgAction::SetTrue),
        )
}

#[derive(Debug)]
pub struct Options {
    pub cookie_key: SecretString,
    pub cookie_domain: Option<String>,
    pub insecure_cookies: bool,
}

impl Options {
    /// Collect session cookie options from validated matches.
    ///
    /// # Errors
    /// Returns an error if the cookie key argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            cookie_key: matches
                .get_one::<String>(ARG_COOKIE_KEY)
                .cloned()
                .map(SecretString::from)
                .context("missing required argument: --cookie-key")?,
            cookie_domain: matches.get_one::<String>(ARG_COOKIE_DOMAIN).cloned(),
            insecure_cookies: matches.get_flag(ARG_INSECURE_COOKIES),
        })
    }
}
