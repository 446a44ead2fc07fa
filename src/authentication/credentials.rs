//! HTTP Basic credential parsing and verification
//!
//! The expected pair is stored only as SHA-256 digests. Presented values are
//! digested and compared with `subtle`, and both halves are always compared
//! so timing does not reveal which one was wrong.

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;
use subtle::ConstantTimeEq;

use crate::utils::crypto::sha256_digest;

/// A username/password pair presented by a client
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credential {
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Parse an `Authorization: Basic ...` header value
    ///
    /// The scheme is matched case-insensitively. Returns `None` for other
    /// schemes, invalid base64, non UTF-8 payloads or a payload without `:`.
    #[must_use]
    pub fn from_basic_header(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self::new(username, password))
    }

    /// Extract Basic credentials from the request's `Authorization` header
    #[must_use]
    pub fn from_request(req: &HttpRequest) -> Option<Self> {
        let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
        Self::from_basic_header(header)
    }
}

/// Checks presented credentials against the single configured pair
#[derive(Clone)]
pub struct CredentialVerifier {
    expected_username_digest: [u8; 32],
    expected_password_digest: [u8; 32],
}

impl fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVerifier").finish_non_exhaustive()
    }
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            expected_username_digest: sha256_digest(username.as_bytes()),
            expected_password_digest: sha256_digest(password.as_bytes()),
        }
    }

    /// True only when both username and password match exactly
    #[must_use]
    pub fn verify(&self, credential: &Credential) -> bool {
        let username_digest = sha256_digest(credential.username.as_bytes());
        let password_digest = sha256_digest(credential.password.as_bytes());

        let username_ok = username_digest[..].ct_eq(&self.expected_username_digest[..]);
        let password_ok = password_digest[..].ct_eq(&self.expected_password_digest[..]);

        (username_ok & password_ok).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RequestBuilder;

    fn basic(payload: &str) -> String {
        format!("Basic {}", STANDARD.encode(payload))
    }

    #[test]
    fn test_parse_basic_header() {
        let credential = Credential::from_basic_header(&basic("p:m")).unwrap();
        assert_eq!(credential, Credential::new("p", "m"));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let header = format!("bAsIc {}", STANDARD.encode("p:m"));
        assert!(Credential::from_basic_header(&header).is_some());
    }

    #[test]
    fn test_password_may_contain_colon() {
        let credential = Credential::from_basic_header(&basic("user:pa:ss")).unwrap();
        assert_eq!(credential.username, "user");
        assert_eq!(credential.password, "pa:ss");
    }

    #[test]
    fn test_malformed_headers() {
        assert!(Credential::from_basic_header("Bearer abc").is_none());
        assert!(Credential::from_basic_header("Basic !!!not-base64").is_none());
        assert!(Credential::from_basic_header(&basic("no-colon")).is_none());
        assert!(Credential::from_basic_header("Basic").is_none());
        assert!(Credential::from_basic_header("").is_none());
    }

    #[test]
    fn test_from_request() {
        let req = RequestBuilder::with_basic("p", "m");
        assert_eq!(Credential::from_request(&req), Some(Credential::new("p", "m")));
        assert_eq!(Credential::from_request(&RequestBuilder::empty()), None);
    }

    #[test]
    fn test_verify() {
        let verifier = CredentialVerifier::new("p", "m");

        assert!(verifier.verify(&Credential::new("p", "m")));
        assert!(!verifier.verify(&Credential::new("p", "x")));
        assert!(!verifier.verify(&Credential::new("x", "m")));
        assert!(!verifier.verify(&Credential::new("", "")));
        assert!(!verifier.verify(&Credential::new("P", "m")));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Credential::new("p", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
