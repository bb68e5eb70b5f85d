//! Key-value store port - local persisted documents
//!
//! Stands in for browser local storage: a flat namespace of string values
//! under fixed keys. Documents are JSON; a document that fails to parse is
//! treated as empty.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::result::Result;

/// Fixed keys of the local documents
pub mod keys {
    /// JSON list of stored users
    pub const USERS: &str = "users";
    /// Opaque token of the active session
    pub const SESSION_TOKEN: &str = "sessionToken";
    /// User id of the active session
    pub const CURRENT_USER_ID: &str = "currentUserId";
    /// Access token issued by the hosted backend's auth service
    ///
    /// Independent of the local session token, which the backend cannot verify.
    pub const BACKEND_ACCESS_TOKEN: &str = "backendAccessToken";
    /// JSON list of donation certificates
    pub const CERTIFICATES: &str = "donation_certificates";
}

/// Local key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value unconditionally
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Write `value` only if the current value equals `expected`
    ///
    /// `expected = None` means the key must be absent. Returns `false` when
    /// another writer got there first.
    fn compare_and_swap(&self, key: &str, expected: Option<&str>, value: &str) -> Result<bool>;
}

/// A JSON list document together with the raw value it was parsed from
///
/// The raw value is what a later compare-and-swap must expect.
#[derive(Debug)]
pub struct ListDocument<T> {
    pub raw: Option<String>,
    pub items: Vec<T>,
}

/// Load a JSON list document, treating corrupted content as empty
pub fn load_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<ListDocument<T>> {
    let raw = store.get(key)?;
    let items = match raw.as_deref() {
        None => Vec::new(),
        Some(content) => match serde_json::from_str(content) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable local document");
                Vec::new()
            }
        },
    };
    Ok(ListDocument { raw, items })
}

/// Serialize a list document
pub fn encode_list<T: Serialize>(items: &[T]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}
