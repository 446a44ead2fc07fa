//! HTTP request builders for testing the gateway and handlers

use actix_web::cookie::Cookie;
use actix_web::{test, HttpRequest};
use base64::{engine::general_purpose::STANDARD, Engine};

use super::constants::TEST_USER_AGENT;

/// Builder for creating HTTP requests for testing
pub struct RequestBuilder {
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set common browser headers
    #[must_use]
    pub fn browser_headers(self) -> Self {
        self.header("User-Agent", TEST_USER_AGENT).header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
    }

    /// Add an `Authorization: Basic` header for the pair
    #[must_use]
    pub fn basic(self, username: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        self.header("Authorization", &format!("Basic {encoded}"))
    }

    #[must_use]
    pub fn cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn build(self) -> HttpRequest {
        let mut req = test::TestRequest::default();

        for (name, value) in self.headers {
            req = req.insert_header((name, value));
        }

        for cookie in self.cookies {
            req = req.cookie(cookie);
        }

        req.to_http_request()
    }
}

/// Quick builder functions for common request types
impl RequestBuilder {
    /// Create an empty request with no headers
    #[must_use]
    pub fn empty() -> HttpRequest {
        Self::new().build()
    }

    /// Create a browser request carrying one cookie
    #[must_use]
    pub fn with_cookie(cookie: Cookie<'static>) -> HttpRequest {
        Self::new().browser_headers().cookie(cookie).build()
    }

    /// Create a request carrying Basic credentials
    #[must_use]
    pub fn with_basic(username: &str, password: &str) -> HttpRequest {
        Self::new().basic(username, password).build()
    }
}
