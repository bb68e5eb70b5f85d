//! Wallet connector - connect state over an injected wallet provider
//!
//! Connecting only learns an address; nothing is signed. Disconnecting is
//! a local reset and does not revoke the provider's authorization.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;
use tokio::sync::watch;

use crate::domain::result::{Error, Result};
use crate::ports::{AccountsListener, SubscriptionId, WalletProvider};

/// Connection state seen by the front-end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    pub address: Option<String>,
    pub is_connected: bool,
}

impl WalletState {
    fn connected(address: &str) -> Self {
        Self {
            address: Some(address.to_string()),
            is_connected: true,
        }
    }

    /// State after an account-change event
    fn from_accounts(accounts: &[String]) -> Self {
        accounts
            .first()
            .map(|a| Self::connected(a))
            .unwrap_or_default()
    }
}

/// Short form `0x1234...abcd` for display
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Whether `address` looks like a 20-byte hex account address
pub fn is_valid_address(address: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(address))
}

/// Clears the in-flight flag when a connect attempt ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct WalletConnector {
    provider: Option<Arc<dyn WalletProvider>>,
    state: Arc<watch::Sender<WalletState>>,
    connecting: AtomicBool,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl WalletConnector {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        let (state, _) = watch::channel(WalletState::default());
        Self {
            provider,
            state: Arc::new(state),
            connecting: AtomicBool::new(false),
            subscription: Mutex::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub fn state(&self) -> WalletState {
        self.state.borrow().clone()
    }

    pub fn address(&self) -> Option<String> {
        self.state.borrow().address.clone()
    }

    /// Subscribe to connection state changes
    pub fn watch(&self) -> watch::Receiver<WalletState> {
        self.state.subscribe()
    }

    /// Pick up an existing authorization without prompting
    pub async fn check_connected(&self) -> Result<Option<String>> {
        let Some(provider) = &self.provider else {
            return Ok(None);
        };
        let accounts = provider.list_accounts().await?;
        let state = WalletState::from_accounts(&accounts);
        let address = state.address.clone();
        self.state.send_replace(state);
        Ok(address)
    }

    /// Prompt for accounts and return the active address
    pub async fn connect(&self) -> Result<String> {
        let provider = self.provider.as_ref().ok_or(Error::ProviderMissing)?;
        if self.connecting.swap(true, Ordering::SeqCst) {
            return Err(Error::RequestPending);
        }
        let _in_flight = InFlight(&self.connecting);

        let accounts = provider.request_accounts().await?;
        let address = accounts
            .first()
            .cloned()
            .ok_or_else(|| Error::Wallet("provider returned no accounts".to_string()))?;
        tracing::debug!(address = %format_address(&address), "wallet connected");
        self.state.send_replace(WalletState::connected(&address));
        Ok(address)
    }

    pub fn disconnect(&self) {
        self.state.send_replace(WalletState::default());
    }

    /// Start following account changes; calling it again is a no-op
    pub fn mount(&self) {
        let Some(provider) = &self.provider else {
            return;
        };
        let Ok(mut subscription) = self.subscription.lock() else {
            return;
        };
        if subscription.is_some() {
            return;
        }
        let state = Arc::clone(&self.state);
        let listener: AccountsListener = Arc::new(move |accounts: &[String]| {
            state.send_replace(WalletState::from_accounts(accounts));
        });
        *subscription = Some(provider.subscribe(listener));
    }

    /// Stop following account changes
    pub fn unmount(&self) {
        let (Some(provider), Ok(mut subscription)) = (&self.provider, self.subscription.lock()) else {
            return;
        };
        if let Some(id) = subscription.take() {
            provider.unsubscribe(id);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}

impl Drop for WalletConnector {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ApprovalPolicy, StaticWalletProvider};
    use std::time::Duration;

    const ADDR: &str = "0x1234567890abcdef1234567890abcdef12345678";
    const OTHER: &str = "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd";

    fn provider() -> Arc<StaticWalletProvider> {
        Arc::new(StaticWalletProvider::new(vec![ADDR.to_string()]))
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(ADDR), "0x1234...5678");
        assert_eq!(format_address("0xabc"), "0xabc");
    }

    #[test]
    fn test_is_valid_address() {
        assert!(is_valid_address(ADDR));
        assert!(!is_valid_address("0x123"));
        assert!(!is_valid_address("1234567890abcdef1234567890abcdef12345678"));
    }

    #[tokio::test]
    async fn test_provider_missing() {
        let connector = WalletConnector::new(None);
        assert!(matches!(connector.connect().await, Err(Error::ProviderMissing)));
        assert_eq!(connector.check_connected().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_check_connected_does_not_prompt() {
        let provider = provider();
        let connector = WalletConnector::new(Some(provider.clone()));
        assert_eq!(connector.check_connected().await.unwrap(), None);
        assert!(!connector.state().is_connected);

        let authorized = Arc::new(StaticWalletProvider::new(vec![ADDR.to_string()]).authorized());
        let connector = WalletConnector::new(Some(authorized));
        assert_eq!(connector.check_connected().await.unwrap().as_deref(), Some(ADDR));
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let provider = provider();
        let connector = WalletConnector::new(Some(provider.clone()));
        assert_eq!(connector.connect().await.unwrap(), ADDR);
        assert!(connector.state().is_connected);

        connector.disconnect();
        assert_eq!(connector.state(), WalletState::default());
        // Provider authorization survives a local disconnect
        assert_eq!(connector.check_connected().await.unwrap().as_deref(), Some(ADDR));
    }

    #[tokio::test]
    async fn test_rejected_and_pending() {
        let provider = provider();
        let connector = WalletConnector::new(Some(provider.clone()));

        provider.set_policy(ApprovalPolicy::Reject);
        assert!(matches!(connector.connect().await, Err(Error::UserRejected)));
        provider.set_policy(ApprovalPolicy::Pending);
        assert!(matches!(connector.connect().await, Err(Error::RequestPending)));
        assert!(!connector.state().is_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_connect_while_in_flight() {
        let provider = Arc::new(
            StaticWalletProvider::new(vec![ADDR.to_string()]).with_request_delay(Duration::from_secs(3)),
        );
        let connector = WalletConnector::new(Some(provider));

        let (first, second) = tokio::join!(connector.connect(), connector.connect());
        assert_eq!(first.unwrap(), ADDR);
        assert!(matches!(second, Err(Error::RequestPending)));

        // The flag is cleared once the first attempt finishes
        assert!(connector.connect().await.is_ok());
    }

    #[tokio::test]
    async fn test_mount_follows_account_changes_once() {
        let provider = provider();
        let connector = WalletConnector::new(Some(provider.clone()));
        connector.mount();
        connector.mount();
        assert_eq!(provider.listener_count(), 1);

        provider.emit_accounts_changed(vec![OTHER.to_string(), ADDR.to_string()]);
        assert_eq!(connector.address().as_deref(), Some(OTHER));

        provider.emit_accounts_changed(vec![]);
        assert_eq!(connector.state(), WalletState::default());

        connector.unmount();
        assert_eq!(provider.listener_count(), 0);
        provider.emit_accounts_changed(vec![ADDR.to_string()]);
        assert_eq!(connector.address(), None);
    }

    #[tokio::test]
    async fn test_watch_sees_connect() {
        let connector = WalletConnector::new(Some(provider()));
        let mut updates = connector.watch();
        connector.connect().await.unwrap();
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().address.as_deref(), Some(ADDR));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let provider = provider();
        {
            let connector = WalletConnector::new(Some(provider.clone()));
            connector.mount();
            assert!(connector.is_mounted());
            assert_eq!(provider.listener_count(), 1);
        }
        assert_eq!(provider.listener_count(), 0);
    }
}
