//! Test fixtures providing pre-built test objects

use std::sync::Arc;

use crate::authentication::AuthGateway;
use crate::oauth::{ExternalIdentity, OAuthHandshakeState, ProviderConfig, ProviderExchange, ProviderRegistry};
use crate::settings::{AppSettings, ProviderSettings};
use serde_json::json;

use super::constants::{
    TEST_EMAIL, TEST_PASSWORD, TEST_PROVIDER_ID, TEST_REDIRECT_BASE_URL, TEST_SESSION_SECRET,
    TEST_USERNAME,
};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Valid settings with google and github enabled
    #[must_use]
    pub fn settings() -> AppSettings {
        let mut settings = AppSettings::default();
        settings.application.redirect_base_url = TEST_REDIRECT_BASE_URL.to_string();
        settings.session.session_secret = TEST_SESSION_SECRET.to_string();
        settings.basic_auth.username = TEST_USERNAME.to_string();
        settings.basic_auth.password = TEST_PASSWORD.to_string();
        settings.providers = vec![
            Self::provider_settings("google"),
            Self::provider_settings("github"),
        ];
        settings
    }

    #[must_use]
    pub fn provider_settings(name: &str) -> ProviderSettings {
        ProviderSettings {
            name: name.to_string(),
            client_id: Some(format!("{name}-client-id")),
            client_secret: Some(format!("{name}-client-secret")),
            ..Default::default()
        }
    }

    /// # Panics
    ///
    /// Panics if `name` is not a provider with built-in endpoints
    #[must_use]
    pub fn provider(name: &str) -> ProviderConfig {
        ProviderConfig::from_settings(&Self::provider_settings(name)).unwrap()
    }

    /// # Panics
    ///
    /// Panics if the fixture settings are invalid
    #[must_use]
    pub fn registry() -> ProviderRegistry {
        ProviderRegistry::from_settings(&Self::settings()).unwrap()
    }

    #[must_use]
    pub fn identity(provider: &str) -> ExternalIdentity {
        ExternalIdentity {
            provider: provider.to_string(),
            email: TEST_EMAIL.to_string(),
            provider_user_id: TEST_PROVIDER_ID.to_string(),
            raw_attributes: json!({"sub": TEST_PROVIDER_ID, "email": TEST_EMAIL})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn handshake(provider: &str, nonce: &str) -> OAuthHandshakeState {
        OAuthHandshakeState::new(provider, nonce.to_string(), None)
    }

    /// Gateway over the fixture settings with an injected exchange
    ///
    /// # Panics
    ///
    /// Panics if the fixture settings are invalid
    #[must_use]
    pub fn gateway_with(exchange: Arc<dyn ProviderExchange>) -> AuthGateway {
        AuthGateway::from_settings_with_exchange(&Self::settings(), exchange).unwrap()
    }
}
