//! Wallet provider port
//!
//! Models an injected EIP-1193 style wallet (a browser extension in the
//! web front-end). Only account discovery and account-change notifications
//! are needed; nothing is ever signed.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::result::Error;

/// Callback invoked with the new account list on account changes
pub type AccountsListener = Arc<dyn Fn(&[String]) + Send + Sync>;

/// Handle returned by [`WalletProvider::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Error reported by a wallet provider, with its EIP-1193 code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    /// The user rejected the request
    pub const USER_REJECTED: i64 = 4001;
    /// A request of the same kind is already pending
    pub const REQUEST_PENDING: i64 = -32002;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User rejected the request.")
    }

    pub fn request_pending() -> Self {
        Self::new(Self::REQUEST_PENDING, "Request already pending.")
    }
}

impl From<ProviderError> for Error {
    fn from(e: ProviderError) -> Self {
        match e.code {
            ProviderError::USER_REJECTED => Error::UserRejected,
            ProviderError::REQUEST_PENDING => Error::RequestPending,
            _ => Error::Wallet(e.to_string()),
        }
    }
}

/// Injected wallet provider
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Provider name (e.g., "static", "metamask")
    fn name(&self) -> &str;

    /// Accounts already authorized for this application; never prompts
    async fn list_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Ask the user to authorize accounts; may prompt
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Register an account-change listener
    fn subscribe(&self, listener: AccountsListener) -> SubscriptionId;

    /// Remove a listener registered with [`WalletProvider::subscribe`]
    fn unsubscribe(&self, id: SubscriptionId);
}
