use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Minimum accepted length of the session secret, in bytes
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Longest accepted handshake lifetime: one day
pub const MAX_HANDSHAKE_TTL_MINUTES: i64 = 1_440;

/// Longest accepted provider exchange timeout
pub const MAX_EXCHANGE_TIMEOUT_SECONDS: u64 = 300;

/// Authorization URL parameters set by the gateway itself
pub const RESERVED_AUTH_PARAMS: &[&str] =
    &["client_id", "redirect_uri", "response_type", "scope", "state"];

/// Configuration problems detected at startup
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: basic_toml::Error,
    },

    #[error("missing required configuration: {0}")]
    Missing(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    pub application: ApplicationSettings,
    pub session: SessionSettings,
    pub basic_auth: BasicAuthSettings,
    pub oauth: OAuthSettings,
    pub logging: LoggingSettings,
    pub providers: Vec<ProviderSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Public base URL the provider redirects back to
    pub redirect_base_url: String,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Secret used to sign session tokens and encrypt handshake cookies
    pub session_secret: String,
    /// How long a begun OAuth handshake may wait for its callback
    pub handshake_ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BasicAuthSettings {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    /// Upper bound on the provider token + userinfo exchange
    pub exchange_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub name: String,
    pub display_name: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
    /// Consulted when userinfo carries no email (GitHub's `/user/emails`)
    pub emails_endpoint: Option<String>,
    /// Empty means the provider's built-in default scopes
    pub scopes: Vec<String>,

    // Direct values (can be overridden by environment variables)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment variable names for overrides
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,

    pub enabled: bool,
    pub extra_auth_params: BTreeMap<String, String>,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            redirect_base_url: "http://localhost:8080".to_string(),
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            handshake_ttl_minutes: 10,
        }
    }
}

impl SessionSettings {
    /// The handshake lifetime, checked against its accepted range
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` unless the TTL is between one minute
    /// and [`MAX_HANDSHAKE_TTL_MINUTES`]
    pub fn handshake_ttl(&self) -> Result<chrono::Duration, SettingsError> {
        let minutes = self.handshake_ttl_minutes;
        if !(1..=MAX_HANDSHAKE_TTL_MINUTES).contains(&minutes) {
            return Err(SettingsError::Invalid(format!(
                "handshake_ttl_minutes must be between 1 and {MAX_HANDSHAKE_TTL_MINUTES}"
            )));
        }
        chrono::Duration::try_minutes(minutes).ok_or_else(|| {
            SettingsError::Invalid(format!("handshake_ttl_minutes {minutes} is out of range"))
        })
    }
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            exchange_timeout_seconds: 10,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: None,
            authorization_endpoint: None,
            token_endpoint: None,
            userinfo_endpoint: None,
            emails_endpoint: None,
            scopes: Vec::new(),
            client_id: None,
            client_secret: None,
            client_id_env: None,
            client_secret_env: None,
            enabled: true,
            extra_auth_params: BTreeMap::new(),
        }
    }
}

impl AppSettings {
    /// Load, validate and apply settings, then initialise logging
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed, or if a
    /// required value is missing or invalid.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let settings = Self::from_sources()?;
        settings.validate()?;
        settings.init_logging();

        Ok(settings)
    }

    /// Build settings from defaults, settings files and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Settings.toml in `GATEWAY_SECRETS_DIR` (if set and present)
    /// 3. Settings.toml in the current directory (if present)
    /// 4. Defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or parsed
    pub fn from_sources() -> Result<Self, SettingsError> {
        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        Ok(settings)
    }

    fn load_base_settings() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            println!("✓ Loaded base settings from {}", default_config_path.display());
        }

        if let Ok(secrets_dir) = std::env::var("GATEWAY_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ GATEWAY_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single TOML settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        basic_toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_basic_auth_env_overrides(&mut settings.basic_auth);
        Self::apply_oauth_env_overrides(&mut settings.oauth);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(redirect_base_url) = std::env::var("REDIRECT_BASE_URL") {
            app_settings.redirect_base_url = redirect_base_url;
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(secret) = std::env::var("SESSION_SECRET") {
            if !secret.is_empty() {
                session_settings.session_secret = secret;
            }
        }
        if let Ok(ttl) = std::env::var("HANDSHAKE_TTL_MINUTES") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                session_settings.handshake_ttl_minutes = ttl;
            }
        }
    }

    /// Apply environment overrides for the Basic auth credential pair
    pub fn apply_basic_auth_env_overrides(basic_settings: &mut BasicAuthSettings) {
        if let Ok(username) = std::env::var("BASIC_AUTH_USERNAME") {
            basic_settings.username = username;
        }
        if let Ok(password) = std::env::var("BASIC_AUTH_PASSWORD") {
            basic_settings.password = password;
        }
    }

    fn apply_oauth_env_overrides(oauth_settings: &mut OAuthSettings) {
        if let Ok(timeout) = std::env::var("OAUTH_EXCHANGE_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                oauth_settings.exchange_timeout_seconds = timeout;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Reject configurations the service cannot safely run with
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid value found
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.session.session_secret.is_empty() {
            return Err(SettingsError::Missing(
                "session secret (SESSION_SECRET or [session] session_secret)".to_string(),
            ));
        }
        if self.session.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(SettingsError::Invalid(format!(
                "session secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
            )));
        }
        self.session.handshake_ttl()?;
        if self.basic_auth.username.is_empty() || self.basic_auth.password.is_empty() {
            return Err(SettingsError::Missing(
                "Basic auth credentials (BASIC_AUTH_USERNAME / BASIC_AUTH_PASSWORD)".to_string(),
            ));
        }
        if !(1..=MAX_EXCHANGE_TIMEOUT_SECONDS).contains(&self.oauth.exchange_timeout_seconds) {
            return Err(SettingsError::Invalid(format!(
                "exchange_timeout_seconds must be between 1 and {MAX_EXCHANGE_TIMEOUT_SECONDS}"
            )));
        }
        if url::Url::parse(&self.application.redirect_base_url).is_err() {
            return Err(SettingsError::Invalid(format!(
                "redirect_base_url '{}' is not an absolute URL",
                self.application.redirect_base_url
            )));
        }
        let mut seen = HashSet::new();
        for provider in self.get_enabled_providers() {
            if !seen.insert(provider.name.as_str()) {
                return Err(SettingsError::Invalid(format!(
                    "provider '{}' is configured more than once",
                    provider.name
                )));
            }
            if let Some(key) = provider
                .extra_auth_params
                .keys()
                .find(|key| RESERVED_AUTH_PARAMS.contains(&key.as_str()))
            {
                return Err(SettingsError::Invalid(format!(
                    "extra_auth_params for provider '{}' may not set '{key}'",
                    provider.name
                )));
            }
            if provider.get_client_id().is_none() {
                return Err(SettingsError::Missing(format!(
                    "client_id for provider '{}'",
                    provider.name
                )));
            }
            if provider.get_client_secret().is_none() {
                return Err(SettingsError::Missing(format!(
                    "client_secret for provider '{}'",
                    provider.name
                )));
            }
        }
        Ok(())
    }

    fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.logging.level.as_str());
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            eprintln!("Logger already initialised: {e}");
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Get enabled providers
    #[must_use]
    pub fn get_enabled_providers(&self) -> Vec<&ProviderSettings> {
        self.providers.iter().filter(|p| p.enabled).collect()
    }
}

impl ProviderSettings {
    /// Get the client ID, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        Self::resolve(self.client_id_env.as_deref(), self.client_id.as_ref())
    }

    /// Get the client secret, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        Self::resolve(self.client_secret_env.as_deref(), self.client_secret.as_ref())
    }

    fn resolve(env_var: Option<&str>, direct: Option<&String>) -> Option<String> {
        if let Some(env_var) = env_var {
            if let Ok(value) = std::env::var(env_var) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        direct.filter(|value| !value.is_empty()).cloned()
    }
}
