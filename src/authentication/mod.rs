//! Authentication module
//!
//! - [`credentials`] - Basic credential parsing and constant-time verification
//! - [`gateway`] - The per-request decision between cookie, Basic and OAuth

pub mod credentials;
pub mod gateway;

pub use credentials::{Credential, CredentialVerifier};
pub use gateway::{
    AuthGateway, AuthOutcome, AuthenticatedSession, OAuthBegin, OAuthCompletion, SessionOrigin,
};
