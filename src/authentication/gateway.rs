use actix_web::cookie::Cookie;
use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use std::sync::Arc;
use std::time::Duration;

use crate::authentication::credentials::{Credential, CredentialVerifier};
use crate::error::AuthError;
use crate::oauth::{
    BeginOutcome, CallbackParams, ExternalIdentity, HttpProviderExchange, MemoryHandshakeStore,
    OAuthCompletionProtocol, ProviderExchange, ProviderRegistry,
};
use crate::session::{CookieFactory, SessionToken};
use crate::settings::{AppSettings, SettingsError};
use crate::utils::logging::LoggingHelper;

/// How the caller's session was established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// An existing `user_session` cookie
    Cookie,
    /// Basic credentials on this request; a new session was minted
    BasicAuth,
}

impl SessionOrigin {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cookie => "cookie",
            Self::BasicAuth => "basic auth",
        }
    }
}

#[derive(Debug)]
pub struct AuthenticatedSession {
    pub token: SessionToken,
    pub origin: SessionOrigin,
    /// Set only when the session was minted on this request
    pub cookie: Option<Cookie<'static>>,
}

/// Result of classifying a non-OAuth request
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated(AuthenticatedSession),
    /// An `Authorization` header was present but did not verify
    Unauthorized,
    Anonymous,
}

#[derive(Debug)]
pub enum OAuthBegin {
    AlreadyAuthenticated(SessionToken),
    Redirect {
        location: String,
        handshake_cookie: Cookie<'static>,
    },
}

#[derive(Debug)]
pub struct OAuthCompletion {
    pub identity: ExternalIdentity,
    pub token: SessionToken,
    pub redirect_url: Option<String>,
    pub session_cookie: Cookie<'static>,
    /// Clears the binding cookie of the completed handshake
    pub cleared_handshake_cookie: Cookie<'static>,
}

/// Decides how each request is authenticated
///
/// The router sends `/auth/{provider}` paths to [`AuthGateway::begin_oauth`]
/// and [`AuthGateway::complete_oauth`]. Every other authenticated route goes
/// through [`AuthGateway::authenticate`], which prefers a valid session
/// cookie, then Basic credentials, and otherwise treats the caller as
/// anonymous.
#[derive(Clone)]
pub struct AuthGateway {
    verifier: CredentialVerifier,
    cookies: CookieFactory,
    oauth: Arc<OAuthCompletionProtocol>,
}

impl AuthGateway {
    #[must_use]
    pub fn new(
        verifier: CredentialVerifier,
        cookies: CookieFactory,
        oauth: Arc<OAuthCompletionProtocol>,
    ) -> Self {
        Self {
            verifier,
            cookies,
            oauth,
        }
    }

    /// Build the gateway with the HTTP provider exchange
    ///
    /// # Errors
    ///
    /// Returns an error if a provider is misconfigured or the HTTP client
    /// cannot be built
    pub fn from_settings(settings: &AppSettings) -> Result<Self, SettingsError> {
        let timeout = Duration::from_secs(settings.oauth.exchange_timeout_seconds);
        let exchange = HttpProviderExchange::new(timeout)
            .map_err(|e| SettingsError::Invalid(format!("HTTP client: {e}")))?;
        Self::from_settings_with_exchange(settings, Arc::new(exchange))
    }

    /// Build the gateway around a caller-supplied provider exchange
    ///
    /// # Errors
    ///
    /// Returns an error if a provider is misconfigured or the handshake TTL
    /// is out of range
    pub fn from_settings_with_exchange(
        settings: &AppSettings,
        exchange: Arc<dyn ProviderExchange>,
    ) -> Result<Self, SettingsError> {
        LoggingHelper::log_oauth_provider_initialization();
        let registry = ProviderRegistry::from_settings(settings)?;
        for provider in registry.iter() {
            LoggingHelper::log_oauth_provider_configured(&provider.display_name, &provider.name);
        }
        LoggingHelper::log_oauth_providers_summary(&registry);

        let ttl = settings.session.handshake_ttl()?;
        let store = Arc::new(MemoryHandshakeStore::new(ttl));
        let oauth = OAuthCompletionProtocol::new(
            Arc::new(registry),
            store,
            exchange,
            Duration::from_secs(settings.oauth.exchange_timeout_seconds),
        );

        Ok(Self::new(
            CredentialVerifier::new(&settings.basic_auth.username, &settings.basic_auth.password),
            CookieFactory::new(settings.session.session_secret.as_bytes(), ttl.num_minutes()),
            Arc::new(oauth),
        ))
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieFactory {
        &self.cookies
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        self.oauth.registry()
    }

    /// Classify a request by its session cookie or Basic credentials
    #[must_use]
    pub fn authenticate(&self, req: &HttpRequest) -> AuthOutcome {
        if let Some(token) = self.cookies.read_session(req) {
            return AuthOutcome::Authenticated(AuthenticatedSession {
                token,
                origin: SessionOrigin::Cookie,
                cookie: None,
            });
        }

        if !req.headers().contains_key(AUTHORIZATION) {
            return AuthOutcome::Anonymous;
        }

        match Credential::from_request(req) {
            Some(credential) if self.verifier.verify(&credential) => {
                let token = SessionToken::mint();
                LoggingHelper::log_session_created(SessionOrigin::BasicAuth.as_str(), None);
                AuthOutcome::Authenticated(AuthenticatedSession {
                    token,
                    origin: SessionOrigin::BasicAuth,
                    cookie: Some(self.cookies.create_session_cookie(&token)),
                })
            }
            _ => {
                log::warn!("Rejected Authorization header");
                AuthOutcome::Unauthorized
            }
        }
    }

    /// Begin an OAuth handshake for `provider`
    ///
    /// # Errors
    ///
    /// `AuthError::UnknownProvider` for an unconfigured provider,
    /// `AuthError::Internal` if the handshake cannot be recorded
    pub fn begin_oauth(
        &self,
        req: &HttpRequest,
        provider: &str,
        redirect: Option<&str>,
    ) -> Result<OAuthBegin, AuthError> {
        let existing = self.cookies.read_session(req);

        match self.oauth.begin(provider, existing, redirect)? {
            BeginOutcome::AlreadyAuthenticated(token) => Ok(OAuthBegin::AlreadyAuthenticated(token)),
            BeginOutcome::Redirect {
                authorization_url,
                handshake,
            } => {
                let handshake_cookie = self
                    .cookies
                    .create_handshake_cookie(&handshake)
                    .map_err(|e| AuthError::Internal(format!("handshake cookie: {e}")))?;
                Ok(OAuthBegin::Redirect {
                    location: authorization_url,
                    handshake_cookie,
                })
            }
        }
    }

    /// Finish an OAuth handshake and mint a session for the identity
    ///
    /// # Errors
    ///
    /// Any error of [`OAuthCompletionProtocol::complete`]
    pub async fn complete_oauth(
        &self,
        req: &HttpRequest,
        provider: &str,
        params: &CallbackParams,
    ) -> Result<OAuthCompletion, AuthError> {
        let nonce = params.state.as_deref().unwrap_or_default();
        let bound = self.cookies.read_handshake(req, nonce);
        let completion = self.oauth.complete(provider, params, bound.as_ref()).await?;

        let token = SessionToken::mint();
        LoggingHelper::log_session_created("oauth", Some(provider));

        Ok(OAuthCompletion {
            identity: completion.identity,
            token,
            redirect_url: completion.redirect_url,
            session_cookie: self.cookies.create_session_cookie(&token),
            cleared_handshake_cookie: self.cookies.create_expired_handshake_cookie(nonce),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock::FakeExchange;
    use crate::testing::{RequestBuilder, TestFixtures};

    fn gateway() -> AuthGateway {
        TestFixtures::gateway_with(Arc::new(FakeExchange::succeeding()))
    }

    fn state_of(location: &str) -> String {
        url::Url::parse(location)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn test_no_credentials_is_anonymous() {
        let outcome = gateway().authenticate(&RequestBuilder::empty());
        assert!(matches!(outcome, AuthOutcome::Anonymous));
    }

    #[test]
    fn test_valid_basic_mints_session() {
        let outcome = gateway().authenticate(&RequestBuilder::with_basic("p", "m"));
        let AuthOutcome::Authenticated(session) = outcome else {
            panic!("expected an authenticated session");
        };
        assert_eq!(session.origin, SessionOrigin::BasicAuth);
        assert!(session.cookie.is_some());
    }

    #[test]
    fn test_wrong_basic_is_unauthorized() {
        let outcome = gateway().authenticate(&RequestBuilder::with_basic("p", "x"));
        assert!(matches!(outcome, AuthOutcome::Unauthorized));
    }

    #[test]
    fn test_valid_cookie_wins_over_basic() {
        let gateway = gateway();
        let token = SessionToken::mint();
        let req = RequestBuilder::new()
            .cookie(gateway.cookies().create_session_cookie(&token))
            .header("Authorization", "Basic bm90OnZhbGlk")
            .build();

        let AuthOutcome::Authenticated(session) = gateway.authenticate(&req) else {
            panic!("expected an authenticated session");
        };
        assert_eq!(session.origin, SessionOrigin::Cookie);
        assert_eq!(session.token, token);
        assert!(session.cookie.is_none());
    }

    #[test]
    fn test_malformed_cookie_falls_through_to_basic() {
        let req = RequestBuilder::new()
            .cookie(Cookie::new("user_session", "not-a-token"))
            .basic("p", "m")
            .build();

        let AuthOutcome::Authenticated(session) = gateway().authenticate(&req) else {
            panic!("expected an authenticated session");
        };
        assert_eq!(session.origin, SessionOrigin::BasicAuth);
    }

    #[test]
    fn test_begin_sets_handshake_cookie() {
        let gateway = gateway();
        let begin = gateway
            .begin_oauth(&RequestBuilder::empty(), "google", None)
            .unwrap();

        let OAuthBegin::Redirect { location, handshake_cookie } = begin else {
            panic!("expected a redirect");
        };
        assert!(location.starts_with("https://accounts.google.com/"));
        assert_eq!(
            handshake_cookie.name(),
            format!("oauth_handshake_{}", state_of(&location))
        );
    }

    #[test]
    fn test_out_of_range_ttl_is_a_settings_error() {
        let mut settings = TestFixtures::settings();
        settings.session.handshake_ttl_minutes = i64::MAX / 2;

        let result =
            AuthGateway::from_settings_with_exchange(&settings, Arc::new(FakeExchange::succeeding()));
        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_begin_with_session_short_circuits() {
        let gateway = gateway();
        let token = SessionToken::mint();
        let req = RequestBuilder::with_cookie(gateway.cookies().create_session_cookie(&token));

        let begin = gateway.begin_oauth(&req, "google", None).unwrap();
        assert!(matches!(begin, OAuthBegin::AlreadyAuthenticated(t) if t == token));
    }

    #[actix_web::test]
    async fn test_complete_mints_session_cookie() {
        let gateway = gateway();
        let OAuthBegin::Redirect { location, handshake_cookie } = gateway
            .begin_oauth(&RequestBuilder::empty(), "google", Some("/home"))
            .unwrap()
        else {
            panic!("expected a redirect");
        };
        let state = state_of(&location);

        let req = RequestBuilder::with_cookie(handshake_cookie);
        let params = CallbackParams {
            code: Some("code".to_string()),
            state: Some(state.clone()),
            ..Default::default()
        };
        let completion = gateway.complete_oauth(&req, "google", &params).await.unwrap();

        assert_eq!(completion.identity.provider, "google");
        assert_eq!(completion.redirect_url.as_deref(), Some("/home"));
        assert_eq!(
            gateway.cookies().decode_session_value(completion.session_cookie.value()).unwrap(),
            completion.token
        );
        assert_eq!(
            completion.cleared_handshake_cookie.name(),
            format!("oauth_handshake_{state}")
        );
        assert_eq!(completion.cleared_handshake_cookie.value(), "");
    }

    #[actix_web::test]
    async fn test_interleaved_handshakes_complete_independently() {
        let gateway = gateway();
        let begin = || {
            let OAuthBegin::Redirect { location, handshake_cookie } = gateway
                .begin_oauth(&RequestBuilder::empty(), "google", None)
                .unwrap()
            else {
                panic!("expected a redirect");
            };
            (state_of(&location), handshake_cookie)
        };
        let (state_a, cookie_a) = begin();
        let (state_b, cookie_b) = begin();

        // The browser holds both bindings when the first tab returns
        let req = RequestBuilder::new()
            .cookie(cookie_a)
            .cookie(cookie_b)
            .build();
        for state in [state_a, state_b] {
            let params = CallbackParams {
                code: Some("code".to_string()),
                state: Some(state),
                ..Default::default()
            };
            assert!(gateway.complete_oauth(&req, "google", &params).await.is_ok());
        }
    }
}
