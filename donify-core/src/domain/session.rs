//! Session domain model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};
use super::User;

/// An active session binding an opaque token to a user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

impl Session {
    /// Issue a new session with a freshly generated token
    pub fn issue(user_id: impl Into<String>) -> Self {
        Self {
            token: format!("dfy_sess_{}", Uuid::new_v4().simple()),
            user_id: user_id.into(),
        }
    }
}

/// Lifecycle of the session service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Created, restore not started
    Uninitialized,
    /// Reading persisted session state
    Restoring,
    /// The current user (or absence of one) is known
    Ready,
}

/// What the front-end is allowed to believe about the current user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Restore has not finished; neither signed in nor signed out
    Loading,
    Anonymous,
    Authenticated(User),
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }
}

/// Outcome of a sign-in attempt
///
/// An unknown email is a branch signal (offer sign-up), not an error; a wrong
/// password carries no sign-up hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn(User),
    NeedsSignUp,
    InvalidPassword,
}

impl SignInOutcome {
    pub fn success(&self) -> bool {
        matches!(self, SignInOutcome::SignedIn(_))
    }

    pub fn needs_sign_up(&self) -> bool {
        matches!(self, SignInOutcome::NeedsSignUp)
    }

    /// Collapse to a result: `None` asks the caller to sign up, a wrong password is an error
    pub fn into_result(self) -> Result<Option<User>> {
        match self {
            SignInOutcome::SignedIn(user) => Ok(Some(user)),
            SignInOutcome::NeedsSignUp => Ok(None),
            SignInOutcome::InvalidPassword => Err(Error::InvalidCredential),
        }
    }

    /// Wire shape used by front-ends: `{success, needsSignUp?}`
    pub fn to_response(&self) -> SignInResponse {
        SignInResponse {
            success: self.success(),
            needs_sign_up: self.needs_sign_up().then_some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_sign_up: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_tokens_are_unique() {
        let a = Session::issue("u1");
        let b = Session::issue("u1");
        assert_ne!(a.token, b.token);
        assert!(a.token.starts_with("dfy_sess_"));
    }

    #[test]
    fn test_wrong_password_is_invalid_credential() {
        assert!(matches!(
            SignInOutcome::InvalidPassword.into_result(),
            Err(Error::InvalidCredential)
        ));
        assert_eq!(SignInOutcome::NeedsSignUp.into_result().unwrap(), None);
    }

    #[test]
    fn test_sign_in_response_shape() {
        let needs = serde_json::to_value(SignInOutcome::NeedsSignUp.to_response()).unwrap();
        assert_eq!(needs, serde_json::json!({"success": false, "needsSignUp": true}));

        let invalid = serde_json::to_value(SignInOutcome::InvalidPassword.to_response()).unwrap();
        assert_eq!(invalid, serde_json::json!({"success": false}));
    }
}
