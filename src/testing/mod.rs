//! Shared testing utilities
//!
//! - [`fixtures`] - Pre-built settings, providers, identities and gateways
//! - [`requests`] - HTTP request builders for testing handlers
//! - [`mock`] - Fake provider exchanges

pub mod fixtures;
pub mod mock;
pub mod requests;

pub use fixtures::TestFixtures;
pub use requests::RequestBuilder;

/// Common test constants
pub mod constants {
    /// Session secret used by every fixture (32+ bytes)
    pub const TEST_SESSION_SECRET: &str = "test-session-secret-0123456789abcdef";

    pub const TEST_USERNAME: &str = "p";

    pub const TEST_PASSWORD: &str = "m";

    pub const TEST_EMAIL: &str = "user@example.com";

    pub const TEST_PROVIDER_ID: &str = "123456789";

    pub const TEST_REDIRECT_BASE_URL: &str = "https://gate.example";

    pub const TEST_USER_AGENT: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
}
