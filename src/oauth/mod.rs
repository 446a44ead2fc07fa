//! OAuth authentication module
//!
//! Provider configuration, the handshake store, the code exchange seam and
//! the completion protocol tying them together.

pub mod exchange;
pub mod identity;
pub mod protocol;
pub mod providers;
pub mod state;

pub use exchange::{HttpProviderExchange, ProviderExchange};
pub use identity::ExternalIdentity;
pub use protocol::{BeginOutcome, CallbackParams, Completion, OAuthCompletionProtocol};
pub use providers::{ProviderConfig, ProviderRegistry};
pub use state::{HandshakeLookup, HandshakeStore, MemoryHandshakeStore, OAuthHandshakeState};
