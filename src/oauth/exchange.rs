//! Provider code exchange
//!
//! [`ProviderExchange`] is the seam between the completion protocol and the
//! network. [`HttpProviderExchange`] is the reqwest implementation: it trades
//! the authorization code at the token endpoint and fetches userinfo with the
//! resulting access token. Providers that hide private addresses from
//! userinfo (GitHub) are asked for their primary verified email separately.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AuthError;
use crate::oauth::identity::{primary_verified_email, ExternalIdentity};
use crate::oauth::providers::ProviderConfig;
use crate::utils::logging::LoggingHelper;

/// Trades an authorization code for the provider's asserted identity
#[async_trait]
pub trait ProviderExchange: Send + Sync {
    /// # Errors
    ///
    /// `AuthError::ProviderExchangeFailure` when the provider cannot be reached
    /// or rejects the code, `AuthError::ProviderIdentityMalformed` when its
    /// answer cannot be turned into an identity
    async fn exchange(
        &self,
        provider: &ProviderConfig,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ExternalIdentity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: Option<String>,
    scope: Option<String>,
    expires_in: Option<u64>,
}

/// Exchange over HTTPS with the provider's token and userinfo endpoints
pub struct HttpProviderExchange {
    http_client: reqwest::Client,
}

impl HttpProviderExchange {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sessiongate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http_client })
    }

    async fn fetch_token(
        &self,
        provider: &ProviderConfig,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
        ];

        LoggingHelper::log_token_exchange_start(&provider.name);
        let response = self
            .http_client
            .post(&provider.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| failure(provider, &format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(
                provider,
                &format!("token endpoint returned {status}"),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| failure(provider, &format!("unreadable token response: {e}")))?;

        LoggingHelper::log_token_exchange_summary(
            &provider.name,
            token.access_token.len(),
            token.token_type.as_deref(),
            token.scope.as_deref(),
            token.expires_in,
        );

        Ok(token)
    }

    async fn fetch_userinfo(
        &self,
        provider: &ProviderConfig,
        access_token: &str,
    ) -> Result<serde_json::Value, AuthError> {
        let response = self
            .http_client
            .get(&provider.userinfo_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| failure(provider, &format!("userinfo request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(
                provider,
                &format!("userinfo endpoint returned {status}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ProviderIdentityMalformed(format!("userinfo is not JSON: {e}")))
    }

    /// Look up the primary verified address when userinfo carries none
    async fn fetch_primary_email(
        &self,
        provider: &ProviderConfig,
        endpoint: &str,
        access_token: &str,
    ) -> Result<Option<String>, AuthError> {
        let response = self
            .http_client
            .get(endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| failure(provider, &format!("email list request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(
                provider,
                &format!("email list endpoint returned {status}"),
            ));
        }

        let emails: serde_json::Value = response.json().await.map_err(|e| {
            AuthError::ProviderIdentityMalformed(format!("email list is not JSON: {e}"))
        })?;
        let email = primary_verified_email(&emails);
        log::debug!(
            "Email list for {}: primary verified address {}",
            provider.name,
            if email.is_some() { "found" } else { "absent" }
        );
        Ok(email)
    }
}

fn failure(provider: &ProviderConfig, detail: &str) -> AuthError {
    LoggingHelper::log_exchange_failure(&provider.name, detail);
    AuthError::ProviderExchangeFailure(detail.to_string())
}

#[async_trait]
impl ProviderExchange for HttpProviderExchange {
    async fn exchange(
        &self,
        provider: &ProviderConfig,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ExternalIdentity, AuthError> {
        let token = self.fetch_token(provider, code, redirect_uri).await?;
        let mut userinfo = self.fetch_userinfo(provider, &token.access_token).await?;

        if let Some(endpoint) = &provider.emails_endpoint {
            if !ExternalIdentity::has_email(&userinfo) {
                let email = self
                    .fetch_primary_email(provider, endpoint, &token.access_token)
                    .await?;
                if let (Some(email), Some(attributes)) = (email, userinfo.as_object_mut()) {
                    attributes.insert("email".to_string(), serde_json::Value::String(email));
                }
            }
        }

        ExternalIdentity::from_userinfo(&provider.name, userinfo)
    }
}
