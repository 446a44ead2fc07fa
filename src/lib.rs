#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the sessiongate application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod error;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

/// Re-export commonly used items
pub use authentication::AuthGateway;
pub use error::AuthError;
pub use handlers::configure_services;
pub use session::SessionToken;
pub use settings::AppSettings;
