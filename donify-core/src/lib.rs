//! Donify Core - Business logic for the Donify donation platform
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Campaign, Donation, Certificate, etc.)
//! - **ports**: Trait definitions for external dependencies (BackendStore, KeyValueStore, WalletProvider)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, PostgREST, JSON files, etc.)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use adapters::{DuckDbBackend, JsonFileStore, MockCertificateIssuer, RestBackend, StaticWalletProvider};
use config::{BackendKind, Config};
use ports::{BackendStore, KeyValueStore, WalletProvider};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{Campaign, Certificate, Donation, DonationForm, User};
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Local database file used outside demo mode
pub const DB_FILENAME: &str = "donify.duckdb";

/// Directory for the local key-value documents
const STORAGE_DIR: &str = "storage";

/// Main context for Donify operations
///
/// Holds the configuration, the stores and every service for one data
/// directory. The session is restored before the context is returned.
pub struct DonifyContext {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub backend: Arc<dyn BackendStore>,
    pub session: SessionService,
    pub certificates: Arc<CertificateService>,
    pub donations: DonationWorkflow,
    pub wallet: WalletConnector,
    pub campaigns: CampaignService,
    pub outreach: OutreachService,
    pub admin: AdminService,
}

impl DonifyContext {
    pub fn new(donify_dir: &Path) -> Result<Self> {
        let config = Config::load(donify_dir)?;
        Self::with_config(donify_dir, config)
    }

    pub fn with_config(donify_dir: &Path, config: Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(
            JsonFileStore::new(&donify_dir.join(STORAGE_DIR)).context("Failed to open local storage")?,
        );

        let session = SessionService::new(Arc::clone(&store));
        if let Err(e) = session.restore() {
            tracing::warn!(error = %e, "session restore failed");
        }

        let backend = open_backend(donify_dir, &config, Arc::clone(&store))?;

        let certs = &config.certificates;
        let issuer = MockCertificateIssuer::new()
            .network(certs.network.clone())
            .contract_address(certs.contract_address.clone())
            .currency_symbol(certs.currency_symbol.clone())
            .image_base_url(certs.image_base_url.clone());
        let certificates = Arc::new(CertificateService::new(Arc::clone(&store), Arc::new(issuer)));

        let donations = DonationWorkflow::new(Arc::clone(&backend), Arc::clone(&certificates))
            .with_confirmation_delay(config.confirmation_delay);

        let provider: Option<Arc<dyn WalletProvider>> = if config.wallet_accounts.is_empty() {
            None
        } else {
            Some(Arc::new(StaticWalletProvider::new(config.wallet_accounts.clone())))
        };
        let wallet = WalletConnector::new(provider);

        Ok(Self {
            campaigns: CampaignService::new(Arc::clone(&backend)),
            outreach: OutreachService::new(Arc::clone(&backend)),
            admin: AdminService::new(Arc::clone(&backend)),
            config,
            store,
            backend,
            session,
            certificates,
            donations,
            wallet,
        })
    }

    /// React to an operation error; a rejected session token signs the user out
    pub fn handle_error(&self, error: &Error) {
        if matches!(error, Error::SessionExpired) {
            if let Err(e) = self.session.handle_unauthorized() {
                tracing::warn!(error = %e, "failed to clear expired session");
            }
        }
    }
}

fn open_backend(
    donify_dir: &Path,
    config: &Config,
    store: Arc<dyn KeyValueStore>,
) -> Result<Arc<dyn BackendStore>> {
    match config.backend.kind {
        BackendKind::Local => {
            let db_filename = if config.demo_mode {
                DEMO_DB_FILENAME
            } else {
                DB_FILENAME
            };
            let db_path = donify_dir.join(db_filename);
            let backend = DuckDbBackend::open(&db_path)
                .with_context(|| format!("Failed to open database {}", db_path.display()))?
                .with_identity(store);
            Ok(Arc::new(backend))
        }
        BackendKind::Rest => {
            let url = config
                .backend
                .url
                .as_deref()
                .ok_or_else(|| anyhow!("backend.url is required for the rest backend"))?;
            let api_key = config
                .backend
                .api_key
                .as_deref()
                .ok_or_else(|| anyhow!("backend.apiKey is required for the rest backend"))?;
            Ok(Arc::new(RestBackend::new(url, api_key, store)?))
        }
    }
}
