//! Provider configuration and registry
//!
//! Known providers (google, github, microsoft) ship with default endpoints
//! and scopes so only client credentials need configuring.

use std::collections::{BTreeMap, HashMap};

use crate::settings::{AppSettings, ProviderSettings, SettingsError, RESERVED_AUTH_PARAMS};

/// Provider-specific OAuth configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub display_name: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    /// Address list queried when userinfo hides the email
    pub emails_endpoint: Option<String>,
    pub scopes: Vec<String>,
    pub extra_auth_params: BTreeMap<String, String>,
}

struct ProviderDefaults {
    display_name: &'static str,
    authorization_endpoint: &'static str,
    token_endpoint: &'static str,
    userinfo_endpoint: &'static str,
    emails_endpoint: Option<&'static str>,
    scopes: &'static [&'static str],
}

fn known_defaults(name: &str) -> Option<ProviderDefaults> {
    match name {
        "google" => Some(ProviderDefaults {
            display_name: "Google",
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth",
            token_endpoint: "https://oauth2.googleapis.com/token",
            userinfo_endpoint: "https://openidconnect.googleapis.com/v1/userinfo",
            emails_endpoint: None,
            scopes: &["openid", "email", "profile"],
        }),
        "github" => Some(ProviderDefaults {
            display_name: "GitHub",
            authorization_endpoint: "https://github.com/login/oauth/authorize",
            token_endpoint: "https://github.com/login/oauth/access_token",
            userinfo_endpoint: "https://api.github.com/user",
            emails_endpoint: Some("https://api.github.com/user/emails"),
            scopes: &["read:user", "user:email"],
        }),
        "microsoft" => Some(ProviderDefaults {
            display_name: "Microsoft",
            authorization_endpoint: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            token_endpoint: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            userinfo_endpoint: "https://graph.microsoft.com/oidc/userinfo",
            emails_endpoint: None,
            scopes: &["openid", "email", "profile"],
        }),
        _ => None,
    }
}

impl ProviderConfig {
    /// Resolve a provider's configuration, filling gaps from built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if client credentials are missing, or if an endpoint is
    /// neither configured nor known for this provider name
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, SettingsError> {
        let client_id = settings.get_client_id().ok_or_else(|| {
            SettingsError::Missing(format!("client_id for provider '{}'", settings.name))
        })?;
        let client_secret = settings.get_client_secret().ok_or_else(|| {
            SettingsError::Missing(format!("client_secret for provider '{}'", settings.name))
        })?;

        let defaults = known_defaults(&settings.name);
        let endpoint = |configured: &Option<String>,
                        default: Option<&'static str>,
                        label: &str|
         -> Result<String, SettingsError> {
            configured
                .clone()
                .or_else(|| default.map(str::to_string))
                .ok_or_else(|| {
                    SettingsError::Missing(format!(
                        "{label} for provider '{}'",
                        settings.name
                    ))
                })
        };

        let authorization_endpoint = endpoint(
            &settings.authorization_endpoint,
            defaults.as_ref().map(|d| d.authorization_endpoint),
            "authorization_endpoint",
        )?;
        let token_endpoint = endpoint(
            &settings.token_endpoint,
            defaults.as_ref().map(|d| d.token_endpoint),
            "token_endpoint",
        )?;
        let userinfo_endpoint = endpoint(
            &settings.userinfo_endpoint,
            defaults.as_ref().map(|d| d.userinfo_endpoint),
            "userinfo_endpoint",
        )?;

        let emails_endpoint = settings
            .emails_endpoint
            .clone()
            .or_else(|| defaults.as_ref().and_then(|d| d.emails_endpoint).map(str::to_string));

        for (label, value) in [
            ("authorization_endpoint", Some(&authorization_endpoint)),
            ("token_endpoint", Some(&token_endpoint)),
            ("userinfo_endpoint", Some(&userinfo_endpoint)),
            ("emails_endpoint", emails_endpoint.as_ref()),
        ] {
            let Some(value) = value else { continue };
            if url::Url::parse(value).is_err() {
                return Err(SettingsError::Invalid(format!(
                    "{label} for provider '{}' is not a valid URL",
                    settings.name
                )));
            }
        }

        let scopes = if settings.scopes.is_empty() {
            defaults
                .as_ref()
                .map(|d| d.scopes.iter().map(|s| (*s).to_string()).collect())
                .unwrap_or_default()
        } else {
            settings.scopes.clone()
        };

        let display_name = settings
            .display_name
            .clone()
            .or_else(|| defaults.as_ref().map(|d| d.display_name.to_string()))
            .unwrap_or_else(|| settings.name.clone());

        Ok(Self {
            name: settings.name.clone(),
            display_name,
            client_id,
            client_secret,
            authorization_endpoint,
            token_endpoint,
            userinfo_endpoint,
            emails_endpoint,
            scopes,
            extra_auth_params: settings.extra_auth_params.clone(),
        })
    }

    /// Build the provider's authorization URL for a handshake
    ///
    /// Extra parameters never replace the ones the gateway sets itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint cannot be parsed
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, url::ParseError> {
        let mut url = url::Url::parse(&self.authorization_endpoint)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);

        for (key, value) in &self.extra_auth_params {
            if RESERVED_AUTH_PARAMS.contains(&key.as_str()) {
                log::warn!("Ignoring reserved auth parameter '{key}' for {}", self.name);
                continue;
            }
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url.to_string())
    }
}

/// The set of enabled providers, keyed by route name
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderConfig>,
    order: Vec<String>,
    redirect_base_url: String,
}

impl ProviderRegistry {
    /// Later entries reusing a name are dropped; the first one wins
    #[must_use]
    pub fn new(providers: Vec<ProviderConfig>, redirect_base_url: &str) -> Self {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for provider in providers {
            if map.contains_key(&provider.name) {
                log::warn!("Skipping duplicate provider '{}'", provider.name);
                continue;
            }
            order.push(provider.name.clone());
            map.insert(provider.name.clone(), provider);
        }
        Self {
            providers: map,
            order,
            redirect_base_url: redirect_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the registry from the enabled providers in settings
    ///
    /// # Errors
    ///
    /// Returns the first provider configuration error
    pub fn from_settings(settings: &AppSettings) -> Result<Self, SettingsError> {
        let providers = settings
            .get_enabled_providers()
            .into_iter()
            .map(ProviderConfig::from_settings)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(providers, &settings.application.redirect_base_url))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Providers in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.order.iter().filter_map(|name| self.providers.get(name))
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// The callback URL registered with the provider
    #[must_use]
    pub fn callback_url(&self, name: &str) -> String {
        format!("{}/auth/{name}/callback", self.redirect_base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFixtures;

    fn provider_settings(name: &str) -> ProviderSettings {
        ProviderSettings {
            name: name.to_string(),
            client_id: Some("client-id".to_string()),
            client_secret: Some("client-secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_known_provider_defaults() {
        let config = ProviderConfig::from_settings(&provider_settings("github")).unwrap();
        assert_eq!(config.display_name, "GitHub");
        assert_eq!(config.token_endpoint, "https://github.com/login/oauth/access_token");
        assert_eq!(config.userinfo_endpoint, "https://api.github.com/user");
        assert_eq!(config.scopes, vec!["read:user", "user:email"]);
        assert_eq!(
            config.emails_endpoint.as_deref(),
            Some("https://api.github.com/user/emails")
        );

        let google = ProviderConfig::from_settings(&provider_settings("google")).unwrap();
        assert!(google.emails_endpoint.is_none());
    }

    #[test]
    fn test_unknown_provider_requires_endpoints() {
        let result = ProviderConfig::from_settings(&provider_settings("gitlab"));
        assert!(matches!(result, Err(SettingsError::Missing(msg)) if msg.contains("authorization_endpoint")));

        let settings = ProviderSettings {
            display_name: Some("GitLab".to_string()),
            authorization_endpoint: Some("https://gitlab.example/oauth/authorize".to_string()),
            token_endpoint: Some("https://gitlab.example/oauth/token".to_string()),
            userinfo_endpoint: Some("https://gitlab.example/oauth/userinfo".to_string()),
            scopes: vec!["openid".to_string(), "email".to_string()],
            ..provider_settings("gitlab")
        };
        let config = ProviderConfig::from_settings(&settings).unwrap();
        assert_eq!(config.display_name, "GitLab");
        assert_eq!(config.scopes, vec!["openid", "email"]);
    }

    #[test]
    fn test_missing_client_secret() {
        let settings = ProviderSettings {
            client_secret: None,
            ..provider_settings("google")
        };
        assert!(ProviderConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_authorization_url_parameters() {
        let mut settings = provider_settings("google");
        settings
            .extra_auth_params
            .insert("prompt".to_string(), "select_account".to_string());
        let config = ProviderConfig::from_settings(&settings).unwrap();

        let url = config
            .authorization_url("https://gate.example/auth/google/callback", "nonce-1")
            .unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let params: HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["redirect_uri"], "https://gate.example/auth/google/callback");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "openid email profile");
        assert_eq!(params["state"], "nonce-1");
        assert_eq!(params["prompt"], "select_account");
    }

    #[test]
    fn test_authorization_url_keeps_reserved_parameters() {
        let mut config = ProviderConfig::from_settings(&provider_settings("google")).unwrap();
        config
            .extra_auth_params
            .insert("state".to_string(), "forged".to_string());
        config
            .extra_auth_params
            .insert("redirect_uri".to_string(), "https://evil.example/".to_string());
        config
            .extra_auth_params
            .insert("access_type".to_string(), "offline".to_string());

        let url = config
            .authorization_url("https://gate.example/auth/google/callback", "nonce-1")
            .unwrap();
        let pairs: Vec<(String, String)> =
            url::Url::parse(&url).unwrap().query_pairs().into_owned().collect();

        let values = |name: &str| -> Vec<&str> {
            pairs
                .iter()
                .filter(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
                .collect()
        };
        assert_eq!(values("state"), vec!["nonce-1"]);
        assert_eq!(values("redirect_uri"), vec!["https://gate.example/auth/google/callback"]);
        assert_eq!(values("access_type"), vec!["offline"]);
    }

    #[test]
    fn test_registry_drops_duplicate_names() {
        let mut second = TestFixtures::provider("google");
        second.display_name = "Second Google".to_string();
        let registry = ProviderRegistry::new(
            vec![TestFixtures::provider("google"), second, TestFixtures::provider("github")],
            "https://gate.example",
        );

        assert_eq!(registry.names(), vec!["google", "github"]);
        assert_eq!(registry.iter().count(), 2);
        assert_eq!(registry.get("google").unwrap().display_name, "Google");
    }

    #[test]
    fn test_registry_from_settings() {
        let registry = ProviderRegistry::from_settings(&TestFixtures::settings()).unwrap();
        assert_eq!(registry.names(), vec!["google", "github"]);
        assert!(registry.get("google").is_some());
        assert!(registry.get("gitlab").is_none());
        assert_eq!(
            registry.callback_url("google"),
            "https://gate.example/auth/google/callback"
        );
    }

    #[test]
    fn test_disabled_provider_not_registered() {
        let mut settings = TestFixtures::settings();
        settings.providers[1].enabled = false;
        let registry = ProviderRegistry::from_settings(&settings).unwrap();
        assert_eq!(registry.names(), vec!["google"]);
    }
}
