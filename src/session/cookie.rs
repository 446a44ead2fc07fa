use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AuthError;
use crate::oauth::OAuthHandshakeState;
use crate::session::token::{SessionCodec, SessionToken};
use crate::utils::crypto::{decrypt_data, derive_encryption_key, encrypt_data};

/// Cookie carrying the encoded session token
pub const SESSION_COOKIE_NAME: &str = "user_session";

/// Prefix of the cookies binding OAuth handshakes to the browser that began
/// them; the handshake nonce completes the name
pub const HANDSHAKE_COOKIE_PREFIX: &str = "oauth_handshake_";

/// Fixed session lifetime: 24 hours
pub const SESSION_MAX_AGE_SECONDS: i64 = 86_400;

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: Duration::seconds(SESSION_MAX_AGE_SECONDS),
        }
    }
}

/// Cookie factory: the transport between session state and HTTP cookies
///
/// Session cookies hold a [`SessionCodec`]-encoded token. Handshake cookies
/// hold an AES-256-GCM encrypted [`OAuthHandshakeState`]. Both keys derive
/// from the configured session secret.
#[derive(Clone)]
pub struct CookieFactory {
    codec: SessionCodec,
    encryption_key: [u8; 32],
    handshake_max_age: Duration,
}

impl CookieFactory {
    #[must_use]
    pub fn new(session_secret: &[u8], handshake_ttl_minutes: i64) -> Self {
        Self {
            codec: SessionCodec::new(session_secret),
            encryption_key: derive_encryption_key(session_secret),
            handshake_max_age: Duration::minutes(handshake_ttl_minutes),
        }
    }

    fn create_cookie(name: &str, value: String, options: CookieOptions) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish()
    }

    /// Generic method to create a cookie holding encrypted data
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    fn create_encrypted_cookie<T: Serialize>(
        &self,
        name: &str,
        data: &T,
        options: CookieOptions,
    ) -> Result<Cookie<'static>> {
        let value = encrypt_data(data, &self.encryption_key)?;
        Ok(Self::create_cookie(name, value, options))
    }

    fn read_encrypted_cookie<T: DeserializeOwned>(&self, req: &HttpRequest, name: &str) -> Option<T> {
        let cookie = req.cookie(name)?;
        match decrypt_data::<T>(cookie.value(), &self.encryption_key) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("Failed to decrypt '{name}' cookie: {e}");
                None
            }
        }
    }

    /// Create the session cookie for a freshly minted token
    ///
    /// Path=/, Max-Age=86400, `HttpOnly`, Secure, SameSite=Lax.
    #[must_use]
    pub fn create_session_cookie(&self, token: &SessionToken) -> Cookie<'static> {
        Self::create_cookie(
            SESSION_COOKIE_NAME,
            self.codec.encode(token),
            CookieOptions::default(),
        )
    }

    /// Decode a raw session cookie value
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedSessionCookie` if the value was not produced
    /// by this factory's codec
    pub fn decode_session_value(&self, value: &str) -> Result<SessionToken, AuthError> {
        Ok(self.codec.decode(value)?)
    }

    /// Read the session token from the request, if a valid one is present
    ///
    /// A cookie that fails to decode counts as no session at all.
    #[must_use]
    pub fn read_session(&self, req: &HttpRequest) -> Option<SessionToken> {
        let cookie = req.cookie(SESSION_COOKIE_NAME)?;
        match self.decode_session_value(cookie.value()) {
            Ok(token) => Some(token),
            Err(e) => {
                log::warn!("Ignoring session cookie: {e}");
                None
            }
        }
    }

    /// Create the short-lived cookie binding a handshake to this browser
    ///
    /// Each handshake gets its own cookie, so several can be in flight from
    /// one browser without displacing each other.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_handshake_cookie(&self, state: &OAuthHandshakeState) -> Result<Cookie<'static>> {
        let cookie = self.create_encrypted_cookie(
            &handshake_cookie_name(&state.nonce),
            state,
            CookieOptions {
                max_age: self.handshake_max_age,
                ..Default::default()
            },
        )?;

        log::debug!(
            "Creating handshake cookie for provider {}: encrypted_len={}",
            state.provider,
            cookie.value().len()
        );

        Ok(cookie)
    }

    /// Read the binding for the handshake `nonce`, if present and intact
    #[must_use]
    pub fn read_handshake(&self, req: &HttpRequest, nonce: &str) -> Option<OAuthHandshakeState> {
        self.read_encrypted_cookie(req, &handshake_cookie_name(nonce))
    }

    /// Create an expired session cookie to clear the session
    #[must_use]
    pub fn create_expired_session_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(SESSION_COOKIE_NAME)
    }

    /// Create an expired binding cookie once the handshake `nonce` completed
    #[must_use]
    pub fn create_expired_handshake_cookie(&self, nonce: &str) -> Cookie<'static> {
        create_expired_cookie(&handshake_cookie_name(nonce))
    }
}

/// Name of the cookie binding the handshake `nonce`
#[must_use]
pub fn handshake_cookie_name(nonce: &str) -> String {
    format!("{HANDSHAKE_COOKIE_PREFIX}{nonce}")
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(0))
        .finish()
}
