//! Bridge to the partner onboarding API.
//!
//! The partner API is an external collaborator: the gateway only starts and
//! finalizes onboardings and binds account memberships; everything else
//! about onboarding lives upstream.

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("partner API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("partner API rejected {operation}: {detail}")]
    Rejected {
        operation: &'static str,
        detail: String,
    },
}

/// A started onboarding, ready for the browser to continue upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedOnboarding {
    pub onboarding_id: String,
    /// Provider-supplied continuation URL, when one is returned.
    pub onboarding_url: Option<String>,
}

/// Result of finalizing an onboarding for an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedOnboarding {
    pub redirect_url: String,
    pub account_membership_id: String,
}

/// Operations the auth flow and onboarding routes consume.
#[async_trait]
pub trait OnboardingBridge: Send + Sync {
    async fn onboard_individual(
        &self,
        account_country: &str,
    ) -> Result<StartedOnboarding, BridgeError>;

    async fn onboard_company(
        &self,
        account_country: &str,
    ) -> Result<StartedOnboarding, BridgeError>;

    async fn finalize(
        &self,
        onboarding_id: &str,
        access_token: &str,
    ) -> Result<FinalizedOnboarding, BridgeError>;

    /// Returns the bound account membership id.
    async fn bind_account_membership(
        &self,
        account_membership_id: &str,
        access_token: &str,
    ) -> Result<String, BridgeError>;
}

const ONBOARD_INDIVIDUAL_MUTATION: &str = r"mutation($input: OnboardIndividualAccountHolderInput!) {
  onboardIndividualAccountHolder(input: $input) {
    onboarding { id onboardingUrl }
  }
}";

const ONBOARD_COMPANY_MUTATION: &str = r"mutation($input: OnboardCompanyAccountHolderInput!) {
  onboardCompanyAccountHolder(input: $input) {
    onboarding { id onboardingUrl }
  }
}";

const FINALIZE_ONBOARDING_MUTATION: &str = r"mutation($input: FinalizeOnboardingInput!) {
  finalizeOnboarding(input: $input) {
    redirectUrl
    accountMembership { id }
  }
}";

const BIND_ACCOUNT_MEMBERSHIP_MUTATION: &str = r"mutation($input: BindAccountMembershipInput!) {
  bindAccountMembership(input: $input) {
    accountMembership { id }
  }
}";

/// Production bridge speaking GraphQL to the partner API.
pub struct PartnerBridge {
    http: reqwest::Client,
    unauthenticated_api_url: Url,
    partner_api_url: Url,
}

impl PartnerBridge {
    #[must_use]
    pub fn new(http: reqwest::Client, unauthenticated_api_url: Url, partner_api_url: Url) -> Self {
        Self {
            http,
            unauthenticated_api_url,
            partner_api_url,
        }
    }

    async fn execute(
        &self,
        url: &Url,
        access_token: Option<&str>,
        operation: &'static str,
        query: &'static str,
        variables: Value,
    ) -> Result<Value, BridgeError> {
        let mut request = self
            .http
            .post(url.clone())
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BridgeError::Rejected { operation, detail });
        }

        let body = response.json::<Value>().await?;
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let detail = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(BridgeError::Rejected { operation, detail });
            }
        }

        Ok(body)
    }

    fn string_at(
        body: &Value,
        pointer: &str,
        operation: &'static str,
    ) -> Result<String, BridgeError> {
        body.pointer(pointer)
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or(BridgeError::Rejected {
                operation,
                detail: format!("malformed response: missing {pointer}"),
            })
    }
}

#[async_trait]
impl OnboardingBridge for PartnerBridge {
    async fn onboard_individual(
        &self,
        account_country: &str,
    ) -> Result<StartedOnboarding, BridgeError> {
        let operation = "onboardIndividualAccountHolder";
        let body = self
            .execute(
                &self.unauthenticated_api_url,
                None,
                operation,
                ONBOARD_INDIVIDUAL_MUTATION,
                json!({ "input": { "accountCountry": account_country } }),
            )
            .await?;

        Ok(StartedOnboarding {
            onboarding_id: Self::string_at(
                &body,
                "/data/onboardIndividualAccountHolder/onboarding/id",
                operation,
            )?,
            onboarding_url: body
                .pointer("/data/onboardIndividualAccountHolder/onboarding/onboardingUrl")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        })
    }

    async fn onboard_company(
        &self,
        account_country: &str,
    ) -> Result<StartedOnboarding, BridgeError> {
        let operation = "onboardCompanyAccountHolder";
        let body = self
            .execute(
                &self.unauthenticated_api_url,
                None,
                operation,
                ONBOARD_COMPANY_MUTATION,
                json!({ "input": { "accountCountry": account_country } }),
            )
            .await?;

        Ok(StartedOnboarding {
            onboarding_id: Self::string_at(
                &body,
                "/data/onboardCompanyAccountHolder/onboarding/id",
                operation,
            )?,
            onboarding_url: body
                .pointer("/data/onboardCompanyAccountHolder/onboarding/onboardingUrl")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        })
    }

    async fn finalize(
        &self,
        onboarding_id: &str,
        access_token: &str,
    ) -> Result<FinalizedOnboarding, BridgeError> {
        let operation = "finalizeOnboarding";
        let body = self
            .execute(
                &self.partner_api_url,
                Some(access_token),
                operation,
                FINALIZE_ONBOARDING_MUTATION,
                json!({ "input": { "onboardingId": onboarding_id } }),
            )
            .await?;

        Ok(FinalizedOnboarding {
            redirect_url: Self::string_at(&body, "/data/finalizeOnboarding/redirectUrl", operation)?,
            account_membership_id: Self::string_at(
                &body,
                "/data/finalizeOnboarding/accountMembership/id",
                operation,
            )?,
        })
    }

    async fn bind_account_membership(
        &self,
        account_membership_id: &str,
        access_token: &str,
    ) -> Result<String, BridgeError> {
        let operation = "bindAccountMembership";
        let body = self
            .execute(
                &self.partner_api_url,
                Some(access_token),
                operation,
                BIND_ACCOUNT_MEMBERSHIP_MUTATION,
                json!({ "input": { "accountMembershipId": account_membership_id } }),
            )
            .await?;

        Self::string_at(
            &body,
            "/data/bindAccountMembership/accountMembership/id",
            operation,
        )
    }
}
