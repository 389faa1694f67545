//! # Guichet (Banking Session & Authentication Gateway)
//!
//! `guichet` sits between a banking web front end and its upstream partner
//! APIs. It owns the OAuth2 Authorization-Code flow against the identity
//! provider, keeps the resulting tokens in an encrypted client-held cookie,
//! transparently refreshes access tokens before they expire, and
//! reverse-proxies API calls while injecting the bearer credential.
//!
//! ## Session Model
//!
//! The session lives entirely in an authenticated-encryption cookie; the
//! gateway holds no server-side session table. Any node can service any
//! request, which keeps horizontal scaling stateless. A corrupted or forged
//! cookie decrypts to an empty session rather than an error.
//!
//! ## Request Pipeline
//!
//! Every inbound request passes through two ordered interceptors before the
//! router: one copies the stored access token onto the request context, the
//! next refreshes it when it expires within a safety window. Either can
//! short-circuit with a response; route handlers only run once both have
//! passed through.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod middleware;
pub mod oauth;
pub mod onboarding;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
