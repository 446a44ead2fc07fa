//! Session tokens
//!
//! A [`SessionToken`] is a random 128-bit identifier minted when a caller
//! authenticates. Before it leaves the process it is encoded by a
//! [`SessionCodec`]: the identifier bytes followed by an HMAC-SHA256 tag,
//! rendered as unpadded base64url. Decoding is the strict inverse and rejects
//! anything `encode` could not have produced.

use crate::utils::crypto::{derive_signing_key, sign, verify_signature, TAG_SIZE};
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Number of identifier bytes in a session token
pub const TOKEN_ID_SIZE: usize = 16;

/// Number of raw bytes in an encoded token (identifier + tag)
pub const ENCODED_TOKEN_SIZE: usize = TOKEN_ID_SIZE + TAG_SIZE;

/// Opaque identifier of an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Mint a fresh token from the operating system's random source
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Reasons an encoded session value is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("session value is not unpadded base64url")]
    Encoding,
    #[error("session value decodes to {0} bytes, expected {ENCODED_TOKEN_SIZE}")]
    Length(usize),
    #[error("session value carries an invalid signature")]
    Signature,
}

/// Encodes and decodes session tokens for transport
#[derive(Clone)]
pub struct SessionCodec {
    signing_key: [u8; 32],
}

impl SessionCodec {
    #[must_use]
    pub fn new(session_secret: &[u8]) -> Self {
        Self {
            signing_key: derive_signing_key(session_secret),
        }
    }

    /// Encode a token into its URL-safe transport form
    #[must_use]
    pub fn encode(&self, token: &SessionToken) -> String {
        let id = token.0.as_bytes();
        let tag = sign(id, &self.signing_key);

        let mut raw = Vec::with_capacity(ENCODED_TOKEN_SIZE);
        raw.extend_from_slice(id);
        raw.extend_from_slice(&tag);

        general_purpose::URL_SAFE_NO_PAD.encode(raw)
    }

    /// Decode a transport value back into a token
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not unpadded base64url, has the wrong
    /// length, or its tag was not produced with this codec's secret.
    pub fn decode(&self, value: &str) -> Result<SessionToken, DecodeError> {
        let raw = general_purpose::URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|_| DecodeError::Encoding)?;

        if raw.len() != ENCODED_TOKEN_SIZE {
            return Err(DecodeError::Length(raw.len()));
        }

        let (id, tag) = raw.split_at(TOKEN_ID_SIZE);
        if !verify_signature(id, tag, &self.signing_key) {
            return Err(DecodeError::Signature);
        }

        let uuid = Uuid::from_slice(id).map_err(|_| DecodeError::Length(raw.len()))?;
        Ok(SessionToken(uuid))
    }
}
