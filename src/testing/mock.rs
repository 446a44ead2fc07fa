//! Fake provider exchanges for isolated protocol and handler tests

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::AuthError;
use crate::oauth::{ExternalIdentity, ProviderConfig, ProviderExchange};

use super::constants::{TEST_EMAIL, TEST_PROVIDER_ID};

enum FakeOutcome {
    Identity,
    Malformed(String),
    Failure(String),
}

/// Exchange returning a canned outcome and counting its calls
pub struct FakeExchange {
    outcome: FakeOutcome,
    calls: AtomicUsize,
}

impl FakeExchange {
    /// Every exchange yields the standard test identity for the provider
    #[must_use]
    pub fn succeeding() -> Self {
        Self::with(FakeOutcome::Identity)
    }

    /// Every exchange reports a malformed identity
    #[must_use]
    pub fn malformed(detail: &str) -> Self {
        Self::with(FakeOutcome::Malformed(detail.to_string()))
    }

    /// Every exchange fails as if the provider were unreachable
    #[must_use]
    pub fn unreachable(detail: &str) -> Self {
        Self::with(FakeOutcome::Failure(detail.to_string()))
    }

    fn with(outcome: FakeOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of exchanges attempted so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderExchange for FakeExchange {
    async fn exchange(
        &self,
        provider: &ProviderConfig,
        _code: &str,
        _redirect_uri: &str,
    ) -> Result<ExternalIdentity, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            FakeOutcome::Identity => ExternalIdentity::from_userinfo(
                &provider.name,
                json!({"sub": TEST_PROVIDER_ID, "email": TEST_EMAIL}),
            ),
            FakeOutcome::Malformed(detail) => Err(AuthError::ProviderIdentityMalformed(detail.clone())),
            FakeOutcome::Failure(detail) => Err(AuthError::ProviderExchangeFailure(detail.clone())),
        }
    }
}

/// Exchange that never answers within a reasonable timeout
pub struct SlowExchange {
    delay: Duration,
}

impl SlowExchange {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ProviderExchange for SlowExchange {
    async fn exchange(
        &self,
        provider: &ProviderConfig,
        _code: &str,
        _redirect_uri: &str,
    ) -> Result<ExternalIdentity, AuthError> {
        tokio::time::sleep(self.delay).await;
        ExternalIdentity::from_userinfo(
            &provider.name,
            json!({"sub": TEST_PROVIDER_ID, "email": TEST_EMAIL}),
        )
    }
}
