//! Session Module
//!
//! Session tokens and their cookie transport.
//!
//! # Modules
//!
//! - [`token`] - Minting, encoding and strict decoding of session tokens
//! - [`cookie`] - Cookie factory with the fixed session cookie attributes

pub mod cookie;
pub mod token;

pub use cookie::{
    handshake_cookie_name, CookieFactory, CookieOptions, HANDSHAKE_COOKIE_PREFIX,
    SESSION_COOKIE_NAME, SESSION_MAX_AGE_SECONDS,
};
pub use token::{DecodeError, SessionCodec, SessionToken};
