//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// Every variant is recoverable at the operation boundary; callers decide
/// whether to show it inline, as a notification, or both.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad user input, shown inline next to the form
    #[error("{0}")]
    Validation(String),

    /// Sign-up with an email that is already registered
    #[error("An account with this email already exists")]
    DuplicateEmail,

    /// Wrong password for an existing account
    #[error("Invalid password. Please try again.")]
    InvalidCredential,

    /// No wallet provider is available
    #[error("No wallet provider found. Install a wallet extension and try again.")]
    ProviderMissing,

    /// The user declined the wallet connection prompt
    #[error("User rejected the connection request")]
    UserRejected,

    /// A wallet connection request is already waiting for the user
    #[error("A connection request is already pending. Check your wallet.")]
    RequestPending,

    /// Any other wallet provider failure
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Backend store call failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Backend uniqueness constraint violated
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Newsletter sign-up for an address that is already subscribed
    #[error("Email already subscribed to our newsletter")]
    AlreadySubscribed,

    /// Backend rejected the session token
    #[error("Session expired. Please sign in again.")]
    SessionExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Certificate generation failed (never aborts a donation)
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Local key-value storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the error comes from the wallet provider
    pub fn is_wallet_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderMissing | Self::UserRejected | Self::RequestPending | Self::Wallet(_)
        )
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        let msg = e.to_string();
        let lower = msg.to_lowercase();
        if lower.contains("duplicate key") || lower.contains("unique constraint") {
            Self::AlreadyExists(msg)
        } else {
            Self::Persistence(msg)
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for front-end serialization)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Attach a context entry
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_from_result_carries_user_facing_message() {
        let err: Result<i32> = Err(Error::DuplicateEmail);
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("An account with this email already exists")
        );
    }

    #[test]
    fn test_with_context() {
        let result = OperationResult::ok(1).with_context("needsSignUp", serde_json::json!(true));
        let context = result.context.unwrap();
        assert_eq!(context["needsSignUp"], serde_json::json!(true));
    }

    #[test]
    fn test_wallet_error_classification() {
        assert!(Error::UserRejected.is_wallet_error());
        assert!(Error::ProviderMissing.is_wallet_error());
        assert!(!Error::InvalidCredential.is_wallet_error());
    }
}
