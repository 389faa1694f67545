//! OAuth2 state round-tripped through the identity provider.

pub mod client;

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Post-authentication action, carried opaquely through the provider as the
/// `state` query parameter and dispatched exhaustively at the callback.
///
/// Each variant carries a random correlation `id`; the same value is
/// mirrored into the session so the callback can reject forged or replayed
/// states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OAuthState {
    /// Plain sign-in; send the browser back to a relative path afterwards.
    Redirect {
        id: String,
        redirect_to: Option<String>,
    },
    /// Complete an onboarding that required authentication to finish.
    FinalizeOnboarding { id: String, onboarding_id: String },
    /// Attach an existing account membership to the session owner.
    BindAccountMembership {
        id: String,
        account_membership_id: String,
    },
}

impl OAuthState {
    /// Generate a fresh correlation id.
    #[must_use]
    pub fn new_id() -> String {
        Ulid::new().to_string()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Redirect { id, .. }
            | Self::FinalizeOnboarding { id, .. }
            | Self::BindAccountMembership { id, .. } => id,
        }
    }

    /// Serialize to url-safe base64 for the `state` query parameter.
    ///
    /// # Errors
    /// Returns an error if JSON encoding fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        Ok(Base64UrlUnpadded::encode_string(&serde_json::to_vec(self)?))
    }

    /// Decode a `state` parameter. Tampered or malformed values yield
    /// `None`; the caller treats that as a state mismatch.
    #[must_use]
    pub fn decode(value: &str) -> Option<Self> {
        let bytes = Base64UrlUnpadded::decode_vec(value).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}
