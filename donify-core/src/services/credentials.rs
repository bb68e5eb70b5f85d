//! Credential store - the persisted user list
//!
//! Users live as one JSON list under the `users` key. Every write goes
//! through compare-and-swap: the list is re-read, re-checked and written
//! only if nobody else wrote in between, so two concurrent sign-ups with
//! the same email cannot both succeed.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::domain::result::{Error, Result};
use crate::domain::StoredUser;
use crate::ports::key_value::{encode_list, keys, load_list};
use crate::ports::KeyValueStore;

/// Upper bound on re-reads when other writers keep winning
const MAX_CAS_ATTEMPTS: usize = 32;

/// Hash a password using argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Other(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC hash; an unparsable hash never matches
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn all(&self) -> Result<Vec<StoredUser>> {
        Ok(load_list(self.store.as_ref(), keys::USERS)?.items)
    }

    /// Case-insensitive lookup
    pub fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>> {
        Ok(self.all()?.into_iter().find(|u| u.has_email(email)))
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<StoredUser>> {
        Ok(self.all()?.into_iter().find(|u| u.id == id))
    }

    /// Append a user, failing with [`Error::DuplicateEmail`] if the email is taken
    pub fn insert(&self, user: StoredUser) -> Result<()> {
        self.modify(|users| {
            if users.iter().any(|u| u.has_email(&user.email)) {
                return Err(Error::DuplicateEmail);
            }
            users.push(user.clone());
            Ok(())
        })
    }

    /// Overwrite a user's wallet address; `None` when the user does not exist
    pub fn set_wallet(&self, user_id: &str, address: &str) -> Result<Option<StoredUser>> {
        self.modify(|users| {
            Ok(users.iter_mut().find(|u| u.id == user_id).map(|u| {
                u.wallet_address = Some(address.to_string());
                u.clone()
            }))
        })
    }

    /// Read-modify-write the user list under compare-and-swap
    fn modify<T>(&self, mut f: impl FnMut(&mut Vec<StoredUser>) -> Result<T>) -> Result<T> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let mut doc = load_list::<StoredUser>(self.store.as_ref(), keys::USERS)?;
            let result = f(&mut doc.items)?;
            let encoded = encode_list(&doc.items)?;
            if self
                .store
                .compare_and_swap(keys::USERS, doc.raw.as_deref(), &encoded)?
            {
                return Ok(result);
            }
            tracing::debug!(attempt, "user list changed concurrently, retrying");
        }
        Err(Error::storage("user list is changing too quickly, try again"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use chrono::Utc;

    fn user(id: &str, email: &str) -> StoredUser {
        StoredUser {
            id: id.to_string(),
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "unused".to_string(),
            wallet_address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("secret1", "not-a-hash"));
    }

    #[test]
    fn test_duplicate_email_is_case_insensitive() {
        let credentials = CredentialStore::new(Arc::new(MemoryStore::new()));
        credentials.insert(user("1", "A@x.com")).unwrap();
        assert!(matches!(
            credentials.insert(user("2", "a@X.com")),
            Err(Error::DuplicateEmail)
        ));
        assert_eq!(credentials.all().unwrap().len(), 1);
        assert_eq!(credentials.find_by_email("a@x.com").unwrap().unwrap().id, "1");
    }

    #[test]
    fn test_corrupted_list_is_replaced() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USERS, "{not json").unwrap();
        let credentials = CredentialStore::new(store.clone());
        assert!(credentials.all().unwrap().is_empty());
        credentials.insert(user("1", "a@x.com")).unwrap();
        assert_eq!(credentials.all().unwrap().len(), 1);
    }

    #[test]
    fn test_set_wallet() {
        let credentials = CredentialStore::new(Arc::new(MemoryStore::new()));
        credentials.insert(user("1", "a@x.com")).unwrap();
        assert!(credentials.set_wallet("missing", "0xabc").unwrap().is_none());
        let updated = credentials.set_wallet("1", "0xabc").unwrap().unwrap();
        assert_eq!(updated.wallet_address.as_deref(), Some("0xabc"));
        let again = credentials.set_wallet("1", "0xdef").unwrap().unwrap();
        assert_eq!(again.wallet_address.as_deref(), Some("0xdef"));
        assert_eq!(
            credentials.find_by_id("1").unwrap().unwrap().wallet_address.as_deref(),
            Some("0xdef")
        );
    }

    #[test]
    fn test_concurrent_sign_ups_with_one_email() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let credentials = CredentialStore::new(Arc::clone(&store));
                std::thread::spawn(move || credentials.insert(user(&i.to_string(), "same@x.com")))
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(successes, 1);
        assert_eq!(CredentialStore::new(store).all().unwrap().len(), 1);
    }
}
