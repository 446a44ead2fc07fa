use serde::Serialize;

use crate::oauth::ExternalIdentity;
use crate::session::SessionToken;

/// Body of every plain status/error response: `{"message": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Body returned by `GET /` when a session cookie is present
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedResponse {
    pub message: &'static str,
    pub data: SessionToken,
}

impl AuthenticatedResponse {
    #[must_use]
    pub fn new(token: SessionToken) -> Self {
        Self {
            message: "Authenticated",
            data: token,
        }
    }
}

/// Body returned by a successful OAuth callback
#[derive(Debug, Clone, Serialize)]
pub struct IdentityResponse {
    pub message: &'static str,
    pub provider: String,
    pub email: String,
    pub provider_user_id: String,
    pub session: SessionToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl IdentityResponse {
    #[must_use]
    pub fn new(identity: &ExternalIdentity, session: SessionToken, redirect: Option<String>) -> Self {
        Self {
            message: "Authenticated",
            provider: identity.provider.clone(),
            email: identity.email.clone(),
            provider_user_id: identity.provider_user_id.clone(),
            session,
            redirect,
        }
    }
}
