//! Session service - sign-up, sign-in and the active session
//!
//! One service instance owns the active session for its key-value store.
//! The state starts `Uninitialized`; [`SessionService::restore`] moves it
//! through `Restoring` to `Ready`, and until then [`SessionService::auth_state`]
//! reports `Loading` rather than a signed-out user.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use super::credentials::{hash_password, verify_password, CredentialStore};
use crate::domain::result::{Error, Result};
use crate::domain::{validate_sign_up, AuthState, Session, SessionPhase, SignInOutcome, StoredUser, User};
use crate::ports::key_value::keys;
use crate::ports::KeyValueStore;

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    session: Option<Session>,
    user: Option<User>,
}

impl SessionState {
    fn view(&self) -> AuthState {
        match (&self.phase, &self.user) {
            (SessionPhase::Ready, Some(user)) => AuthState::Authenticated(user.clone()),
            (SessionPhase::Ready, None) => AuthState::Anonymous,
            _ => AuthState::Loading,
        }
    }
}

pub struct SessionService {
    credentials: CredentialStore,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
}

impl SessionService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            credentials: CredentialStore::new(Arc::clone(&store)),
            store,
            state: Mutex::new(SessionState {
                phase: SessionPhase::Uninitialized,
                session: None,
                user: None,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().map(|s| s.phase).unwrap_or(SessionPhase::Uninitialized)
    }

    pub fn auth_state(&self) -> AuthState {
        self.lock().map(|s| s.view()).unwrap_or(AuthState::Loading)
    }

    pub fn current_user(&self) -> Option<User> {
        self.lock().ok().and_then(|s| s.user.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.lock().ok().and_then(|s| s.session.clone())
    }

    /// Restore the persisted session; runs once, later calls return the current state
    ///
    /// A token and user id that resolve to a stored user activate the
    /// session; any partial or dangling remnants are purged.
    pub fn restore(&self) -> Result<AuthState> {
        {
            let mut state = self.lock()?;
            if state.phase != SessionPhase::Uninitialized {
                return Ok(state.view());
            }
            state.phase = SessionPhase::Restoring;
        }

        let outcome = match self.read_persisted_session() {
            Ok(Some((session, user))) => {
                tracing::debug!(user_id = %user.id, "session restored");
                let mut state = self.lock()?;
                state.session = Some(session);
                state.user = Some(user);
                Ok(())
            }
            Ok(None) => self.purge(),
            Err(e) => self.purge().and(Err(e)),
        };
        self.lock()?.phase = SessionPhase::Ready;
        outcome?;
        Ok(self.auth_state())
    }

    fn read_persisted_session(&self) -> Result<Option<(Session, User)>> {
        let token = self.store.get(keys::SESSION_TOKEN)?;
        let user_id = self.store.get(keys::CURRENT_USER_ID)?;
        let (Some(token), Some(user_id)) = (token, user_id) else {
            return Ok(None);
        };
        let Some(user) = self.credentials.find_by_id(&user_id)? else {
            tracing::debug!(%user_id, "persisted session references an unknown user");
            return Ok(None);
        };
        Ok(Some((Session { token, user_id }, user.to_public())))
    }

    /// Register a new account and sign it in
    pub fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User> {
        validate_sign_up(name, email, password).map_err(Error::validation)?;

        let stored = StoredUser {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password_hash: hash_password(password)?,
            wallet_address: None,
            created_at: Utc::now(),
        };
        self.credentials.insert(stored.clone())?;
        self.activate(&stored)
    }

    /// Sign in; an unknown email is reported as [`SignInOutcome::NeedsSignUp`]
    pub fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome> {
        let Some(stored) = self.credentials.find_by_email(email)? else {
            return Ok(SignInOutcome::NeedsSignUp);
        };
        if !verify_password(password, &stored.password_hash) {
            return Ok(SignInOutcome::InvalidPassword);
        }
        Ok(SignInOutcome::SignedIn(self.activate(&stored)?))
    }

    /// Clear the active session; signing out twice is fine
    pub fn sign_out(&self) -> Result<()> {
        self.purge()?;
        tracing::debug!("signed out");
        Ok(())
    }

    /// Attach a wallet address to the signed-in user, overwriting any previous one
    ///
    /// Without a signed-in user this does nothing and returns `None`.
    pub fn link_wallet(&self, address: &str) -> Result<Option<User>> {
        let Some(user_id) = self.current_user().map(|u| u.id) else {
            return Ok(None);
        };
        let Some(updated) = self.credentials.set_wallet(&user_id, address)? else {
            return Ok(None);
        };
        let public = updated.to_public();
        let mut state = self.lock()?;
        if state.user.as_ref().map(|u| u.id.as_str()) == Some(user_id.as_str()) {
            state.user = Some(public.clone());
        }
        Ok(Some(public))
    }

    /// Drop the session after the backend rejected its token
    pub fn handle_unauthorized(&self) -> Result<()> {
        tracing::info!("session rejected by backend, signing out");
        self.purge()
    }

    fn activate(&self, stored: &StoredUser) -> Result<User> {
        let session = Session::issue(&stored.id);
        self.store.set(keys::SESSION_TOKEN, &session.token)?;
        self.store.set(keys::CURRENT_USER_ID, &session.user_id)?;

        let user = stored.to_public();
        let mut state = self.lock()?;
        state.phase = SessionPhase::Ready;
        state.session = Some(session);
        state.user = Some(user.clone());
        tracing::debug!(user_id = %user.id, "session activated");
        Ok(user)
    }

    fn purge(&self) -> Result<()> {
        {
            let mut state = self.lock()?;
            state.session = None;
            state.user = None;
        }
        self.store.remove(keys::SESSION_TOKEN)?;
        self.store.remove(keys::CURRENT_USER_ID)?;
        self.store.remove(keys::BACKEND_ACCESS_TOKEN)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;

    fn service() -> (SessionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = SessionService::new(store.clone());
        service.restore().unwrap();
        (service, store)
    }

    #[test]
    fn test_loading_until_restored() {
        let service = SessionService::new(Arc::new(MemoryStore::new()));
        assert_eq!(service.phase(), SessionPhase::Uninitialized);
        assert!(service.auth_state().is_loading());

        assert_eq!(service.restore().unwrap(), AuthState::Anonymous);
        assert_eq!(service.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_sign_up_activates_session() {
        let (service, store) = service();
        let user = service.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();

        assert_eq!(user.name, "Jane Doe");
        assert_eq!(service.auth_state().user(), Some(&user));
        assert_eq!(store.get(keys::CURRENT_USER_ID).unwrap(), Some(user.id.clone()));
        let token = store.get(keys::SESSION_TOKEN).unwrap().unwrap();
        assert_eq!(service.session().unwrap().token, token);
    }

    #[test]
    fn test_sign_up_validation() {
        let (service, _) = service();
        assert!(matches!(service.sign_up("", "a@x.com", "secret1"), Err(Error::Validation(_))));
        assert!(matches!(service.sign_up("A", "nope", "secret1"), Err(Error::Validation(_))));
        assert!(matches!(service.sign_up("A", "a@x.com", "12345"), Err(Error::Validation(_))));
        assert_eq!(service.current_user(), None);
    }

    #[test]
    fn test_sign_in_outcomes() {
        let (service, _) = service();
        service.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();
        service.sign_out().unwrap();

        assert_eq!(service.sign_in("nobody@x.com", "secret1").unwrap(), SignInOutcome::NeedsSignUp);
        assert_eq!(service.sign_in("jane@x.com", "wrong").unwrap(), SignInOutcome::InvalidPassword);
        assert_eq!(service.current_user(), None);

        let outcome = service.sign_in("JANE@x.com", "secret1").unwrap();
        assert!(outcome.success());
        assert_eq!(service.current_user().unwrap().email, "jane@x.com");
    }

    #[test]
    fn test_each_sign_in_issues_a_new_token() {
        let (service, _) = service();
        service.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();
        let first = service.session().unwrap().token;
        service.sign_in("jane@x.com", "secret1").unwrap();
        assert_ne!(service.session().unwrap().token, first);
    }

    #[test]
    fn test_sign_out_is_idempotent() {
        let (service, store) = service();
        service.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();
        store.set(keys::BACKEND_ACCESS_TOKEN, "jwt-abc").unwrap();
        service.sign_out().unwrap();
        service.sign_out().unwrap();
        assert_eq!(service.auth_state(), AuthState::Anonymous);
        assert_eq!(store.get(keys::SESSION_TOKEN).unwrap(), None);
        assert_eq!(store.get(keys::CURRENT_USER_ID).unwrap(), None);
        assert_eq!(store.get(keys::BACKEND_ACCESS_TOKEN).unwrap(), None);
    }

    #[test]
    fn test_link_wallet() {
        let (service, _) = service();
        assert_eq!(service.link_wallet("0xabc").unwrap(), None);

        service.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();
        let user = service.link_wallet("0xabc").unwrap().unwrap();
        assert_eq!(user.wallet_address.as_deref(), Some("0xabc"));
        service.link_wallet("0xdef").unwrap();
        assert_eq!(service.current_user().unwrap().wallet_address.as_deref(), Some("0xdef"));
    }

    #[test]
    fn test_restore_resumes_persisted_session() {
        let store = Arc::new(MemoryStore::new());
        let first = SessionService::new(store.clone());
        first.restore().unwrap();
        let user = first.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();

        let second = SessionService::new(store.clone());
        let state = second.restore().unwrap();
        assert_eq!(state.user().map(|u| u.id.clone()), Some(user.id));
    }

    #[test]
    fn test_restore_purges_dangling_session() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::SESSION_TOKEN, "dfy_sess_orphan").unwrap();
        store.set(keys::CURRENT_USER_ID, "ghost").unwrap();

        let service = SessionService::new(store.clone());
        assert_eq!(service.restore().unwrap(), AuthState::Anonymous);
        assert_eq!(store.get(keys::SESSION_TOKEN).unwrap(), None);
        assert_eq!(store.get(keys::CURRENT_USER_ID).unwrap(), None);
    }

    #[test]
    fn test_restore_purges_partial_session() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::SESSION_TOKEN, "dfy_sess_partial").unwrap();

        let service = SessionService::new(store.clone());
        service.restore().unwrap();
        assert_eq!(store.get(keys::SESSION_TOKEN).unwrap(), None);
    }

    #[test]
    fn test_handle_unauthorized_signs_out() {
        let (service, store) = service();
        service.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();
        service.handle_unauthorized().unwrap();
        assert_eq!(service.current_user(), None);
        assert_eq!(store.get(keys::SESSION_TOKEN).unwrap(), None);
    }
}
