//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod admin;
mod campaign;
pub mod certificate;
pub mod credentials;
mod demo;
pub mod donation;
pub mod logging;
pub mod migration;
mod outreach;
mod session;
pub mod wallet;

pub use admin::{AdminService, DashboardStats, RecentDonation};
pub use campaign::CampaignService;
pub use certificate::CertificateService;
pub use credentials::CredentialStore;
pub use demo::{DemoService, DEMO_DB_FILENAME};
pub use donation::{DonationFailure, DonationOutcome, DonationWorkflow};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use outreach::OutreachService;
pub use session::SessionService;
pub use wallet::{format_address, WalletConnector, WalletState};
