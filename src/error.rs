//! Authentication error taxonomy
//!
//! Variants carry operator-facing detail for the logs. The HTTP response only
//! ever contains the fixed message from [`AuthError::public_message`].

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::MessageResponse;
use crate::session::DecodeError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("malformed session cookie: {0}")]
    MalformedSessionCookie(#[from] DecodeError),

    #[error("handshake nonce does not match an issued handshake")]
    HandshakeNonceMismatch,

    #[error("handshake expired")]
    HandshakeExpired,

    #[error("provider exchange failed: {0}")]
    ProviderExchangeFailure(String),

    #[error("provider identity malformed: {0}")]
    ProviderIdentityMalformed(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// The only text about this error a caller ever sees
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials | Self::MalformedSessionCookie(_) => "Unauthorized",
            Self::HandshakeNonceMismatch
            | Self::HandshakeExpired
            | Self::ProviderExchangeFailure(_)
            | Self::ProviderIdentityMalformed(_) => "Authentication failed",
            Self::UnknownProvider(_) => "Unknown provider",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::MalformedSessionCookie(_) => StatusCode::UNAUTHORIZED,
            Self::HandshakeNonceMismatch
            | Self::HandshakeExpired
            | Self::ProviderExchangeFailure(_)
            | Self::ProviderIdentityMalformed(_) => StatusCode::BAD_REQUEST,
            Self::UnknownProvider(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(MessageResponse::new(self.public_message()))
    }
}
