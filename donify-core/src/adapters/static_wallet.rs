//! Wallet provider backed by a fixed list of accounts
//!
//! Used by the CLI (accounts come from settings or `DONIFY_WALLET_ADDRESS`)
//! and by tests, which can script how the connection prompt is answered and
//! push account-change events.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{AccountsListener, ProviderError, SubscriptionId, WalletProvider};

/// How the simulated connection prompt is answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApprovalPolicy {
    #[default]
    Approve,
    Reject,
    /// The provider already has a prompt open
    Pending,
}

pub struct StaticWalletProvider {
    available: Vec<String>,
    authorized: Mutex<Vec<String>>,
    policy: Mutex<ApprovalPolicy>,
    request_delay: Option<Duration>,
    listeners: Mutex<BTreeMap<u64, AccountsListener>>,
    next_id: AtomicU64,
}

impl StaticWalletProvider {
    /// Provider offering `accounts`, none of which are authorized yet
    pub fn new(accounts: Vec<String>) -> Self {
        Self {
            available: accounts,
            authorized: Mutex::new(Vec::new()),
            policy: Mutex::new(ApprovalPolicy::Approve),
            request_delay: None,
            listeners: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Treat every account as already authorized
    pub fn authorized(self) -> Self {
        if let Ok(mut authorized) = self.authorized.lock() {
            *authorized = self.available.clone();
        }
        self
    }

    pub fn with_policy(self, policy: ApprovalPolicy) -> Self {
        self.set_policy(policy);
        self
    }

    /// Simulate a user who takes `delay` to answer the prompt
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    pub fn set_policy(&self, policy: ApprovalPolicy) {
        if let Ok(mut current) = self.policy.lock() {
            *current = policy;
        }
    }

    /// Change the authorized accounts and notify every listener
    pub fn emit_accounts_changed(&self, accounts: Vec<String>) {
        if let Ok(mut authorized) = self.authorized.lock() {
            *authorized = accounts.clone();
        }
        // Listeners are cloned out so a callback may call back into the provider
        let listeners: Vec<AccountsListener> = match self.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(&accounts);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn policy(&self) -> ApprovalPolicy {
        self.policy.lock().map(|p| *p).unwrap_or_default()
    }
}

#[async_trait]
impl WalletProvider for StaticWalletProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn list_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.authorized
            .lock()
            .map(|a| a.clone())
            .map_err(|e| ProviderError::new(-32603, e.to_string()))
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        if let Some(delay) = self.request_delay {
            tokio::time::sleep(delay).await;
        }
        match self.policy() {
            ApprovalPolicy::Reject => Err(ProviderError::user_rejected()),
            ApprovalPolicy::Pending => Err(ProviderError::request_pending()),
            ApprovalPolicy::Approve => {
                let mut authorized = self
                    .authorized
                    .lock()
                    .map_err(|e| ProviderError::new(-32603, e.to_string()))?;
                *authorized = self.available.clone();
                Ok(authorized.clone())
            }
        }
    }

    fn subscribe(&self, listener: AccountsListener) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, listener);
        }
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.remove(&id.0);
        }
    }
}
