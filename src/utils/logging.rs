// Centralized logging for the authentication lifecycle.
// Never pass secrets, codes, nonces or tokens here; lengths and names only.
use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::error::AuthError;
use crate::oauth::ProviderRegistry;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log OAuth provider initialization start
    pub fn log_oauth_provider_initialization() {
        info!("🔧 Initializing OAuth providers from configuration...");
    }

    /// Log that a provider is configured
    pub fn log_oauth_provider_configured(display_name: &str, provider_name: &str) {
        info!("✅ {display_name} OAuth2 configured ({provider_name})");
    }

    /// Log summary of configured OAuth providers
    pub fn log_oauth_providers_summary(registry: &ProviderRegistry) {
        if registry.is_empty() {
            info!("ℹ No OAuth providers enabled; only Basic auth is available");
        } else {
            info!("🎯 Configured OAuth providers: {:?}", registry.names());
        }
    }

    /// Log OAuth URL building
    pub fn log_oauth_url_built(provider: &str, scopes: &[String], extra_params: &BTreeMap<String, String>) {
        debug!(
            "🔍 Built {provider} OAuth URL with scopes: {} and extra params: {:?}",
            scopes.join(" "),
            extra_params.keys().collect::<Vec<_>>()
        );
    }

    /// Log that a handshake was recorded and the browser redirected
    pub fn log_handshake_begun(provider: &str, pending: usize, has_redirect: bool) {
        info!("➡️  OAuth handshake begun for {provider} (pending handshakes: {pending}, post-login redirect: {has_redirect})");
    }

    /// Log that a begin request was short-circuited by a valid session
    pub fn log_already_authenticated(provider: &str) {
        debug!("Session cookie already valid; skipping {provider} handshake");
    }

    /// Log a rejected callback
    pub fn log_handshake_rejected(provider: &str, error: &AuthError) {
        warn!("❌ OAuth callback for {provider} rejected: {error}");
    }

    /// Log token exchange start
    pub fn log_token_exchange_start(provider: &str) {
        info!("🔄 Exchanging authorization code with {provider}");
    }

    /// Log the shape of a successful token response
    pub fn log_token_exchange_summary(
        provider: &str,
        access_token_len: usize,
        token_type: Option<&str>,
        scope: Option<&str>,
        expires_in: Option<u64>,
    ) {
        debug!(
            "Token exchange with {provider} succeeded: access_token_len={access_token_len}, token_type={token_type:?}, scope={scope:?}, expires_in={expires_in:?}"
        );
    }

    /// Log a failed provider call
    pub fn log_exchange_failure(provider: &str, detail: &str) {
        log::error!("Provider exchange with {provider} failed: {detail}");
    }

    /// Log session creation
    pub fn log_session_created(origin: &str, provider: Option<&str>) {
        match provider {
            Some(provider) => info!("🍪 Session issued via {origin} ({provider})"),
            None => info!("🍪 Session issued via {origin}"),
        }
    }
}
