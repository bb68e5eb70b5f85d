//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

pub mod campaign;
pub mod certificate;
pub mod donation;
pub mod outreach;
pub mod result;
mod session;
mod user;

pub use campaign::{Campaign, CampaignFilter, CampaignSort, NewCampaign};
pub use certificate::{Certificate, CertificateAttribute, CertificateMetadata, CertificateRequest};
pub use donation::{
    Donation, DonationForm, DonationStage, PaymentMethod, PaymentStatus, RecurringFrequency,
};
pub use outreach::{NewsletterSubscriber, Volunteer, VolunteerApplication, VolunteerStatus};
pub use session::{AuthState, Session, SessionPhase, SignInOutcome, SignInResponse};
pub use user::{normalize_email, validate_email, validate_sign_up, StoredUser, User};
