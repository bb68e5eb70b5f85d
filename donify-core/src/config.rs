//! Configuration management
//!
//! `settings.json` in the data directory:
//! ```json
//! {
//!   "app": { "demoMode": false },
//!   "payments": { "confirmationDelayMs": 2000 },
//!   "certificates": { "network": "Polygon Mumbai Testnet", "currencySymbol": "₹" },
//!   "backend": { "kind": "rest", "url": "https://…", "apiKey": "…" },
//!   "wallet": { "accounts": ["0x…"] }
//! }
//! ```
//! Keys the library does not manage are kept when the file is saved.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::adapters::mock_issuer::{DEFAULT_CURRENCY_SYMBOL, DEFAULT_IMAGE_BASE_URL, DEFAULT_NETWORK};
use crate::services::donation::DEFAULT_CONFIRMATION_DELAY;
use crate::services::wallet::is_valid_address;

const SETTINGS_FILE: &str = "settings.json";

pub const ENV_DEMO_MODE: &str = "DONIFY_DEMO_MODE";
pub const ENV_BACKEND_URL: &str = "DONIFY_BACKEND_URL";
pub const ENV_BACKEND_API_KEY: &str = "DONIFY_BACKEND_API_KEY";
pub const ENV_WALLET_ADDRESS: &str = "DONIFY_WALLET_ADDRESS";
pub const ENV_PAYMENT_DELAY_MS: &str = "DONIFY_PAYMENT_DELAY_MS";

type Extra = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    payments: PaymentSettings,
    #[serde(default)]
    certificates: CertificateSettings,
    #[serde(default)]
    backend: BackendSettings,
    #[serde(default)]
    wallet: WalletSettings,
    #[serde(flatten)]
    other: Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(flatten)]
    other: Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confirmation_delay_ms: Option<u64>,
    #[serde(flatten)]
    other: Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CertificateSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currency_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_base_url: Option<String>,
    #[serde(flatten)]
    other: Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendSettings {
    #[serde(default)]
    kind: BackendKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(flatten)]
    other: Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletSettings {
    #[serde(default)]
    accounts: Vec<String>,
    #[serde(flatten)]
    other: Extra,
}

/// Which backend store holds campaigns and donations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local DuckDB file
    #[default]
    Local,
    /// Hosted PostgREST-style API
    Rest,
}

/// Certificate presentation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateConfig {
    pub network: String,
    pub contract_address: Option<String>,
    pub currency_symbol: String,
    pub image_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: Option<String>,
    pub api_key: Option<String>,
}

/// Donify configuration (resolved view of settings.json plus environment)
#[derive(Debug, Clone)]
pub struct Config {
    pub demo_mode: bool,
    pub confirmation_delay: Duration,
    pub certificates: CertificateConfig,
    pub backend: BackendConfig,
    /// Accounts exposed by the built-in wallet provider
    pub wallet_accounts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(&SettingsFile::default(), |_| None)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn read_settings(donify_dir: &Path) -> Result<SettingsFile> {
    let settings_path = donify_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "unreadable settings.json, using defaults");
        SettingsFile::default()
    }))
}

impl Config {
    /// Load config from the data directory, applying `DONIFY_*` overrides
    pub fn load(donify_dir: &Path) -> Result<Self> {
        Self::load_with_env(donify_dir, |key| std::env::var(key).ok())
    }

    /// Load config with an explicit environment lookup
    pub fn load_with_env(donify_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = read_settings(donify_dir)?;
        Ok(Self::resolve(&raw, env))
    }

    fn resolve(raw: &SettingsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let demo_mode = env(ENV_DEMO_MODE)
            .as_deref()
            .and_then(parse_flag)
            .unwrap_or(raw.app.demo_mode);

        let delay_ms = match env(ENV_PAYMENT_DELAY_MS) {
            Some(value) => value.trim().parse::<u64>().ok().or_else(|| {
                tracing::warn!(value = %value, "ignoring invalid {}", ENV_PAYMENT_DELAY_MS);
                raw.payments.confirmation_delay_ms
            }),
            None => raw.payments.confirmation_delay_ms,
        };
        let confirmation_delay = delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CONFIRMATION_DELAY);

        let certs = &raw.certificates;
        let certificates = CertificateConfig {
            network: certs.network.clone().unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
            contract_address: certs.contract_address.clone().filter(|a| !a.trim().is_empty()),
            currency_symbol: certs
                .currency_symbol
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()),
            image_base_url: certs
                .image_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
        };

        let url = env(ENV_BACKEND_URL).or_else(|| raw.backend.url.clone());
        let api_key = env(ENV_BACKEND_API_KEY).or_else(|| raw.backend.api_key.clone());
        // A URL from the environment selects the hosted backend
        let kind = if env(ENV_BACKEND_URL).is_some() {
            BackendKind::Rest
        } else {
            raw.backend.kind
        };

        let accounts = match env(ENV_WALLET_ADDRESS) {
            Some(address) => vec![address.trim().to_string()],
            None => raw.wallet.accounts.clone(),
        };
        let wallet_accounts = accounts
            .into_iter()
            .filter(|a| {
                let valid = is_valid_address(a);
                if !valid {
                    tracing::warn!(account = %a, "ignoring malformed wallet account");
                }
                valid
            })
            .collect();

        Self {
            demo_mode,
            confirmation_delay,
            certificates,
            backend: BackendConfig { kind, url, api_key },
            wallet_accounts,
        }
    }

    /// Save the demo mode flag, keeping every other key as found on disk
    pub fn save(&self, donify_dir: &Path) -> Result<()> {
        let mut settings = read_settings(donify_dir)?;
        settings.app.demo_mode = self.demo_mode;

        std::fs::create_dir_all(donify_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(donify_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }
}
