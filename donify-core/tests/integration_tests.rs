//! Integration tests for donify-core
//!
//! Every test runs against a real data directory: JSON documents on disk and
//! DuckDB files in a temp dir. Only the wallet provider is faked, at the
//! trait level.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use rust_decimal::Decimal;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use donify_core::adapters::demo::generate_demo_campaigns;
use donify_core::adapters::StaticWalletProvider;
use donify_core::config::Config;
use donify_core::domain::{AuthState, CertificateRequest, DonationStage, PaymentStatus};
use donify_core::ports::key_value::keys;
use donify_core::ports::{BackendStore, Filter, KeyValueStore, Table};
use donify_core::services::{DemoService, WalletConnector};
use donify_core::{DonationForm, DonifyContext, Error};

// ============================================================================
// Test Helpers
// ============================================================================

fn test_config(dir: &Path) -> Config {
    let mut config = Config::load_with_env(dir, |_| None).expect("Failed to load config");
    config.confirmation_delay = Duration::ZERO;
    config
}

fn open_context(dir: &Path) -> DonifyContext {
    DonifyContext::with_config(dir, test_config(dir)).expect("Failed to create context")
}

/// Context over a freshly seeded demo database
async fn demo_context(temp_dir: &TempDir) -> DonifyContext {
    DemoService::new(temp_dir.path())
        .enable()
        .await
        .expect("Failed to enable demo mode");
    open_context(temp_dir.path())
}

fn first_campaign_id() -> String {
    generate_demo_campaigns()[0].id.clone()
}

// ============================================================================
// Session Tests
// ============================================================================

#[test]
fn test_jane_doe_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(temp_dir.path());

    let user = ctx.session.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();
    assert_eq!(user.name, "Jane Doe");
    assert!(matches!(ctx.session.auth_state(), AuthState::Authenticated(_)));
    assert!(ctx.store.get(keys::SESSION_TOKEN).unwrap().is_some());

    ctx.session.sign_out().unwrap();
    assert!(ctx.session.current_user().is_none());
    assert!(ctx.store.get(keys::SESSION_TOKEN).unwrap().is_none());

    let wrong = ctx.session.sign_in("jane@x.com", "wrong").unwrap();
    assert!(!wrong.success());
    assert!(!wrong.needs_sign_up());

    assert!(ctx.session.sign_in("jane@x.com", "secret1").unwrap().success());
}

#[test]
fn test_session_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let user_id = {
        let ctx = open_context(temp_dir.path());
        ctx.session.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap().id
    };

    let ctx = open_context(temp_dir.path());
    assert_eq!(ctx.session.current_user().map(|u| u.id), Some(user_id));
}

#[test]
fn test_sign_up_then_sign_in_for_many_users() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(temp_dir.path());

    let users = [
        ("Ana Lima", "ana@example.com", "hunter22"),
        ("Bo", "BO@Example.org", "p4ssw0rd!"),
        ("Chen Wei", "chen.wei@example.net", "correct horse"),
    ];
    for (name, email, password) in users {
        ctx.session.sign_up(name, email, password).unwrap();
        ctx.session.sign_out().unwrap();
        assert!(ctx.session.sign_in(email, password).unwrap().success());
        ctx.session.sign_out().unwrap();
    }

    let unknown = ctx.session.sign_in("nobody@example.com", "whatever").unwrap();
    assert!(unknown.needs_sign_up());
    assert_eq!(
        serde_json::to_value(unknown.to_response()).unwrap(),
        serde_json::json!({"success": false, "needsSignUp": true})
    );
}

#[test]
fn test_email_uniqueness_ignores_case() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(temp_dir.path());

    ctx.session.sign_up("First", "A@x.com", "secret1").unwrap();
    assert!(matches!(
        ctx.session.sign_up("Second", "a@x.com", "secret2"),
        Err(Error::DuplicateEmail)
    ));
}

#[test]
fn test_link_wallet_signed_out_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(temp_dir.path());
    ctx.session.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();
    ctx.session.sign_out().unwrap();

    let linked = ctx
        .session
        .link_wallet("0x1234567890abcdef1234567890abcdef12345678")
        .unwrap();
    assert!(linked.is_none());

    ctx.session.sign_in("jane@x.com", "secret1").unwrap();
    assert!(ctx.session.current_user().unwrap().wallet_address.is_none());
}

// ============================================================================
// Certificate Tests
// ============================================================================

#[test]
fn test_certificates_append_in_call_order() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(temp_dir.path());
    let pattern = Regex::new(r"^CERT-[A-Z0-9]{8}-\d{4}$").unwrap();

    let first = ctx
        .certificates
        .generate(&CertificateRequest::new("donation-1", Decimal::new(500, 0)))
        .unwrap();
    let second = ctx
        .certificates
        .generate(&CertificateRequest::new("donation-2", Decimal::new(750, 0)))
        .unwrap();

    for (cert, donation_id) in [(&first, "donation-1"), (&second, "donation-2")] {
        assert_eq!(cert.metadata.donation_id, donation_id);
        assert!(pattern.is_match(&cert.certificate_id), "{}", cert.certificate_id);
    }

    let reopened = open_context(temp_dir.path());
    let listed: Vec<String> = reopened
        .certificates
        .list()
        .unwrap()
        .into_iter()
        .map(|c| c.donation_id)
        .collect();
    assert_eq!(listed, vec!["donation-1", "donation-2"]);
}

// ============================================================================
// Donation Workflow Tests
// ============================================================================

#[tokio::test]
async fn test_donation_validation_failures() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = demo_context(&temp_dir).await;
    let cancel = CancellationToken::new();
    let campaign_id = first_campaign_id();

    for amount in ["0", ""] {
        let form = DonationForm::new(campaign_id.clone(), amount).donor("Jane Doe", "jane@x.com");
        let failure = ctx.donations.submit(&form, &cancel).await.unwrap_err();
        assert_eq!(failure.failed_at, DonationStage::Validating);
    }

    let mut form = DonationForm::new(campaign_id, "500");
    form.donor_name = Some("Jane Doe".to_string());
    let failure = ctx.donations.submit(&form, &cancel).await.unwrap_err();
    assert_eq!(failure.failed_at, DonationStage::Validating);
    assert!(matches!(failure.error, Error::Validation(_)));

    let recorded = ctx
        .backend
        .select(Table::Donations, &Filter::all().eq("payment_status", "pending"), None)
        .await
        .unwrap();
    assert!(recorded.is_empty());
    assert!(ctx.certificates.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_donation_completes_with_one_certificate() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = demo_context(&temp_dir).await;
    let user = ctx.session.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();
    let before = ctx.admin.stats().await.unwrap();

    let form = DonationForm::new(first_campaign_id(), "500").donor("Jane Doe", "jane@x.com");
    let outcome = ctx
        .donations
        .submit(&form, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ctx.donations.current_stage(), DonationStage::Completed);
    assert_eq!(outcome.donation.payment_status, PaymentStatus::Completed);
    assert_eq!(outcome.donation.donor_id.as_deref(), Some(user.id.as_str()));

    let certificate = outcome.certificate.expect("certificate issued");
    assert_eq!(certificate.metadata.donation_id, outcome.donation.id);
    assert_eq!(ctx.certificates.list().unwrap().len(), 1);
    assert_eq!(ctx.certificates.list_for_donor(&user.id).unwrap().len(), 1);

    let after = ctx.admin.stats().await.unwrap();
    assert_eq!(after.total_donations, before.total_donations + 1);
    assert_eq!(after.total_raised, before.total_raised + Decimal::new(500, 0));
    assert_eq!(after.recent_donations[0].donation.id, outcome.donation.id);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_donation_ends_failed() {
    let temp_dir = TempDir::new().unwrap();
    DemoService::new(temp_dir.path()).enable().await.unwrap();
    let mut config = test_config(temp_dir.path());
    config.confirmation_delay = Duration::from_secs(2);
    let ctx = DonifyContext::with_config(temp_dir.path(), config).unwrap();

    let cancel = CancellationToken::new();
    let mut stages = ctx.donations.stage();
    let form = DonationForm::new(first_campaign_id(), "250").donor("Jane Doe", "jane@x.com");

    let (result, _) = tokio::join!(ctx.donations.submit(&form, &cancel), async {
        stages
            .wait_for(|s| *s == DonationStage::AwaitingPaymentConfirmation)
            .await
            .unwrap();
        cancel.cancel();
    });

    let failure = result.unwrap_err();
    assert_eq!(failure.failed_at, DonationStage::AwaitingPaymentConfirmation);
    assert!(matches!(failure.error, Error::Cancelled));

    let failed = ctx
        .backend
        .select(Table::Donations, &Filter::all().eq("payment_status", "failed"), None)
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert!(ctx.certificates.list().unwrap().is_empty());
}

// ============================================================================
// Demo Mode and Wallet Tests
// ============================================================================

#[tokio::test]
async fn test_demo_mode_uses_separate_database() {
    let temp_dir = TempDir::new().unwrap();
    {
        let ctx = open_context(temp_dir.path());
        assert!(ctx.campaigns.list_active().await.unwrap().is_empty());
    }

    let ctx = demo_context(&temp_dir).await;
    assert!(ctx.config.demo_mode);
    assert_eq!(ctx.campaigns.list_active().await.unwrap().len(), 6);
    drop(ctx);

    DemoService::new(temp_dir.path()).disable(false).unwrap();
    let ctx = open_context(temp_dir.path());
    assert!(ctx.campaigns.list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connect_wallet_and_link_to_user() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(temp_dir.path());
    assert!(!ctx.wallet.is_available());

    let address = "0x1234567890abcdef1234567890abcdef12345678";
    let connector = WalletConnector::new(Some(Arc::new(StaticWalletProvider::new(vec![
        address.to_string(),
    ]))));
    ctx.session.sign_up("Jane Doe", "jane@x.com", "secret1").unwrap();

    let connected = connector.connect().await.unwrap();
    let linked = ctx.session.link_wallet(&connected).unwrap().unwrap();
    assert_eq!(linked.wallet_address.as_deref(), Some(address));

    let reopened = open_context(temp_dir.path());
    assert_eq!(
        reopened.session.current_user().unwrap().wallet_address.as_deref(),
        Some(address)
    );
}
