//! Transient handshake correlation state
//!
//! Every `begin` creates one [`OAuthHandshakeState`] keyed by its nonce. The
//! store hands each entry out at most once, so a callback can never be
//! replayed, and expired entries are dropped so abandoned handshakes do not
//! accumulate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Correlation data held between the begin and callback phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthHandshakeState {
    pub provider: String,
    pub nonce: String,
    pub redirect_url: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl OAuthHandshakeState {
    #[must_use]
    pub fn new(provider: &str, nonce: String, redirect_url: Option<String>) -> Self {
        Self {
            provider: provider.to_string(),
            nonce,
            redirect_url,
            issued_at: Utc::now(),
        }
    }

    /// A TTL that overflows the calendar counts as already expired
    #[must_use]
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match self.issued_at.checked_add_signed(ttl) {
            Some(deadline) => deadline <= now,
            None => true,
        }
    }
}

/// Result of redeeming a nonce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeLookup {
    Active(OAuthHandshakeState),
    Expired(OAuthHandshakeState),
    Unknown,
}

/// Storage for in-flight handshakes
///
/// Implementations must make `take` single-use: once a nonce has been
/// returned (active or expired) it is gone.
pub trait HandshakeStore: Send + Sync {
    fn insert(&self, state: OAuthHandshakeState);

    fn take(&self, nonce: &str) -> HandshakeLookup;

    /// Number of handshakes currently held
    fn pending(&self) -> usize;
}

/// Process-local handshake store with a fixed time-to-live
pub struct MemoryHandshakeStore {
    entries: Mutex<HashMap<String, OAuthHandshakeState>>,
    ttl: Duration,
}

impl MemoryHandshakeStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn purge_expired(&self, entries: &mut HashMap<String, OAuthHandshakeState>) {
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, state| !state.is_expired(self.ttl, now));

        let purged = before - entries.len();
        if purged > 0 {
            log::debug!("Purged {purged} expired OAuth handshakes");
        }
    }
}

impl HandshakeStore for MemoryHandshakeStore {
    fn insert(&self, state: OAuthHandshakeState) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        self.purge_expired(&mut entries);
        entries.insert(state.nonce.clone(), state);
    }

    fn take(&self, nonce: &str) -> HandshakeLookup {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.remove(nonce) {
            Some(state) if state.is_expired(self.ttl, Utc::now()) => HandshakeLookup::Expired(state),
            Some(state) => HandshakeLookup::Active(state),
            None => HandshakeLookup::Unknown,
        }
    }

    fn pending(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
