//! OAuth completion protocol
//!
//! `begin` records a handshake and produces the provider authorization URL.
//! `complete` redeems the handshake exactly once, checks it against the
//! browser binding and runs the bounded code exchange.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AuthError;
use crate::oauth::exchange::ProviderExchange;
use crate::oauth::identity::ExternalIdentity;
use crate::oauth::providers::{ProviderConfig, ProviderRegistry};
use crate::oauth::state::{HandshakeLookup, HandshakeStore, OAuthHandshakeState};
use crate::session::SessionToken;
use crate::utils::crypto::{constant_time_eq, generate_csrf_token};
use crate::utils::logging::LoggingHelper;
use crate::utils::redirect_validator::sanitize_redirect;

/// Query parameters the provider sends back to the callback route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Outcome of beginning a handshake
#[derive(Debug)]
pub enum BeginOutcome {
    /// The caller already holds a valid session; no handshake was started
    AlreadyAuthenticated(SessionToken),
    /// Send the browser to the provider
    Redirect {
        authorization_url: String,
        handshake: OAuthHandshakeState,
    },
}

/// A verified callback
#[derive(Debug)]
pub struct Completion {
    pub identity: ExternalIdentity,
    pub redirect_url: Option<String>,
}

pub struct OAuthCompletionProtocol {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn HandshakeStore>,
    exchange: Arc<dyn ProviderExchange>,
    exchange_timeout: Duration,
}

impl OAuthCompletionProtocol {
    #[must_use]
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn HandshakeStore>,
        exchange: Arc<dyn ProviderExchange>,
        exchange_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            exchange,
            exchange_timeout,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn provider(&self, name: &str) -> Result<&ProviderConfig, AuthError> {
        self.registry
            .get(name)
            .ok_or_else(|| AuthError::UnknownProvider(name.to_string()))
    }

    /// Start a handshake with `provider`
    ///
    /// A caller that already holds a valid session is short-circuited and no
    /// handshake state is created.
    ///
    /// # Errors
    ///
    /// `AuthError::UnknownProvider` for an unconfigured provider,
    /// `AuthError::Internal` if the authorization URL cannot be built
    pub fn begin(
        &self,
        provider: &str,
        existing_session: Option<SessionToken>,
        redirect: Option<&str>,
    ) -> Result<BeginOutcome, AuthError> {
        let config = self.provider(provider)?;

        if let Some(token) = existing_session {
            LoggingHelper::log_already_authenticated(provider);
            return Ok(BeginOutcome::AlreadyAuthenticated(token));
        }

        let nonce = generate_csrf_token();
        let redirect_url = redirect.and_then(sanitize_redirect);
        let handshake = OAuthHandshakeState::new(provider, nonce, redirect_url);

        let authorization_url = config
            .authorization_url(&self.registry.callback_url(provider), &handshake.nonce)
            .map_err(|e| AuthError::Internal(format!("authorization URL for {provider}: {e}")))?;
        LoggingHelper::log_oauth_url_built(provider, &config.scopes, &config.extra_auth_params);

        self.store.insert(handshake.clone());
        LoggingHelper::log_handshake_begun(
            provider,
            self.store.pending(),
            handshake.redirect_url.is_some(),
        );

        Ok(BeginOutcome::Redirect {
            authorization_url,
            handshake,
        })
    }

    /// Verify a callback and exchange its code for the provider identity
    ///
    /// `bound` is the handshake carried by the browser's binding cookie.
    /// The stored handshake is consumed before any other check, so a nonce
    /// can never be redeemed twice whatever the outcome.
    ///
    /// # Errors
    ///
    /// - `AuthError::UnknownProvider` for an unconfigured provider
    /// - `AuthError::HandshakeNonceMismatch` for a missing, unknown, already
    ///   used or unbound nonce, or one issued for another provider
    /// - `AuthError::HandshakeExpired` when the handshake outlived its TTL
    /// - `AuthError::ProviderExchangeFailure` when the provider reports an
    ///   error, omits the code, fails or exceeds the exchange timeout
    /// - `AuthError::ProviderIdentityMalformed` for an unusable identity
    pub async fn complete(
        &self,
        provider: &str,
        params: &CallbackParams,
        bound: Option<&OAuthHandshakeState>,
    ) -> Result<Completion, AuthError> {
        let config = self.provider(provider)?;

        let nonce = params
            .state
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::HandshakeNonceMismatch)?;

        let handshake = match self.store.take(nonce) {
            HandshakeLookup::Active(state) => state,
            HandshakeLookup::Expired(_) => return Err(AuthError::HandshakeExpired),
            HandshakeLookup::Unknown => return Err(AuthError::HandshakeNonceMismatch),
        };

        if handshake.provider != provider {
            return Err(AuthError::HandshakeNonceMismatch);
        }

        let bound_matches = bound.is_some_and(|b| {
            b.provider == handshake.provider
                && constant_time_eq(b.nonce.as_bytes(), handshake.nonce.as_bytes())
        });
        if !bound_matches {
            return Err(AuthError::HandshakeNonceMismatch);
        }

        if let Some(error) = &params.error {
            return Err(AuthError::ProviderExchangeFailure(format!(
                "provider returned error '{error}': {}",
                params.error_description.as_deref().unwrap_or("no description")
            )));
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                AuthError::ProviderExchangeFailure("callback carried no authorization code".to_string())
            })?;

        let redirect_uri = self.registry.callback_url(provider);
        let identity = tokio::time::timeout(
            self.exchange_timeout,
            self.exchange.exchange(config, code, &redirect_uri),
        )
        .await
        .map_err(|_| {
            LoggingHelper::log_exchange_failure(provider, "exchange timed out");
            AuthError::ProviderExchangeFailure(format!(
                "exchange exceeded {}s",
                self.exchange_timeout.as_secs()
            ))
        })??;

        Ok(Completion {
            identity,
            redirect_url: handshake.redirect_url,
        })
    }
}
