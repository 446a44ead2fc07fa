use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AuthError;

/// Identity asserted by an external provider after a successful exchange
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalIdentity {
    pub provider: String,
    pub email: String,
    pub provider_user_id: String,
    /// Userinfo attributes as returned by the provider
    #[serde(skip)]
    pub raw_attributes: Map<String, Value>,
}

impl ExternalIdentity {
    /// Build an identity from a provider's userinfo document
    ///
    /// The subject comes from `sub` (OIDC) or `id` (GitHub style, string or
    /// number). `email` must be present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderIdentityMalformed` when the document is not
    /// an object or lacks a usable subject or email
    pub fn from_userinfo(provider: &str, userinfo: Value) -> Result<Self, AuthError> {
        let Value::Object(attributes) = userinfo else {
            return Err(AuthError::ProviderIdentityMalformed(
                "userinfo is not a JSON object".to_string(),
            ));
        };

        let provider_user_id = ["sub", "id"]
            .iter()
            .find_map(|key| match attributes.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                AuthError::ProviderIdentityMalformed("missing subject identifier".to_string())
            })?;

        let email = usable_email(attributes.get("email")).ok_or_else(|| {
            AuthError::ProviderIdentityMalformed("missing email".to_string())
        })?;

        Ok(Self {
            provider: provider.to_string(),
            email,
            provider_user_id,
            raw_attributes: attributes,
        })
    }

    /// Whether a userinfo document already names an email address
    #[must_use]
    pub fn has_email(userinfo: &Value) -> bool {
        usable_email(userinfo.get("email")).is_some()
    }
}

fn usable_email(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Pick the primary, verified address from a GitHub-style email list
///
/// Each entry looks like `{"email": .., "primary": bool, "verified": bool}`.
/// Unverified addresses are never chosen.
#[must_use]
pub fn primary_verified_email(emails: &Value) -> Option<String> {
    emails
        .as_array()?
        .iter()
        .find(|entry| {
            entry.get("primary").and_then(Value::as_bool) == Some(true)
                && entry.get("verified").and_then(Value::as_bool) == Some(true)
        })
        .and_then(|entry| usable_email(entry.get("email")))
}
