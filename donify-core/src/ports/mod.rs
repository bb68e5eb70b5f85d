//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

pub mod backend;
mod certificate_issuer;
pub mod key_value;
pub mod wallet;

pub use backend::{BackendStore, Filter, Identity, Order, Row, Table};
pub use certificate_issuer::CertificateIssuer;
pub use key_value::KeyValueStore;
pub use wallet::{AccountsListener, ProviderError, SubscriptionId, WalletProvider};
