//! Donation workflow - validate, record, confirm, certify
//!
//! `Idle -> Validating -> Submitting -> AwaitingPaymentConfirmation ->
//! Completed`, with `Failed` reachable from every non-terminal stage. The
//! current stage is published on a watch channel so a front-end can render
//! progress. Payment confirmation is simulated with a fixed delay.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::certificate::CertificateService;
use crate::domain::result::Error;
use crate::domain::{
    Certificate, CertificateRequest, Donation, DonationForm, DonationStage, PaymentStatus,
};
use crate::ports::backend::{from_row, to_row};
use crate::ports::{BackendStore, Filter, Row, Table};

/// Simulated payment confirmation delay
pub const DEFAULT_CONFIRMATION_DELAY: Duration = Duration::from_millis(2000);

/// A completed donation and the certificate issued for it, if any
#[derive(Debug, Clone)]
pub struct DonationOutcome {
    pub donation: Donation,
    pub certificate: Option<Certificate>,
}

/// A donation that did not complete
#[derive(Debug, Error)]
#[error("{error}")]
pub struct DonationFailure {
    /// Stage the workflow was in when it failed
    pub failed_at: DonationStage,
    #[source]
    pub error: Error,
}

pub struct DonationWorkflow {
    backend: Arc<dyn BackendStore>,
    certificates: Arc<CertificateService>,
    confirmation_delay: Duration,
    stage: watch::Sender<DonationStage>,
}

impl DonationWorkflow {
    pub fn new(backend: Arc<dyn BackendStore>, certificates: Arc<CertificateService>) -> Self {
        let (stage, _) = watch::channel(DonationStage::Idle);
        Self {
            backend,
            certificates,
            confirmation_delay: DEFAULT_CONFIRMATION_DELAY,
            stage,
        }
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    /// Subscribe to stage changes
    pub fn stage(&self) -> watch::Receiver<DonationStage> {
        self.stage.subscribe()
    }

    pub fn current_stage(&self) -> DonationStage {
        *self.stage.borrow()
    }

    fn enter(&self, stage: DonationStage) {
        tracing::debug!(?stage, "donation stage");
        self.stage.send_replace(stage);
    }

    fn fail(&self, failed_at: DonationStage, error: Error) -> DonationFailure {
        tracing::debug!(?failed_at, error = %error, "donation failed");
        self.enter(DonationStage::Failed);
        DonationFailure { failed_at, error }
    }

    /// Run a donation through the whole workflow
    ///
    /// Cancelling `cancel` before the payment is confirmed stops the
    /// workflow; a row that was already recorded is marked `failed`.
    pub async fn submit(
        &self,
        form: &DonationForm,
        cancel: &CancellationToken,
    ) -> Result<DonationOutcome, DonationFailure> {
        use DonationStage::*;

        self.enter(Validating);
        let amount = form
            .validate()
            .map_err(|msg| self.fail(Validating, Error::validation(msg)))?;
        if cancel.is_cancelled() {
            return Err(self.fail(Validating, Error::Cancelled));
        }

        self.enter(Submitting);
        let donor_id = match self.backend.current_user().await {
            Ok(identity) => identity.map(|identity| identity.id),
            Err(e) => {
                tracing::warn!(error = %e, "donor lookup failed, recording without donor id");
                None
            }
        };
        let pending = Donation::pending(form, amount, donor_id);
        let row = to_row(&pending).map_err(|e| self.fail(Submitting, e))?;
        let stored = self
            .backend
            .insert(Table::Donations, row)
            .await
            .map_err(|e| self.fail(Submitting, e))?;
        let mut donation: Donation = from_row(stored).map_err(|e| self.fail(Submitting, e))?;

        self.enter(AwaitingPaymentConfirmation);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.mark_failed(&donation.id).await;
                return Err(self.fail(AwaitingPaymentConfirmation, Error::Cancelled));
            }
            _ = tokio::time::sleep(self.confirmation_delay) => {}
        }

        self.backend
            .update(
                Table::Donations,
                status_patch(PaymentStatus::Completed),
                &Filter::all().eq("id", donation.id.clone()),
            )
            .await
            .map_err(|e| self.fail(AwaitingPaymentConfirmation, e))?;
        donation.payment_status = PaymentStatus::Completed;

        self.enter(Completed);
        let certificate = self.issue_certificate(&donation).await;
        Ok(DonationOutcome {
            donation,
            certificate,
        })
    }

    async fn mark_failed(&self, donation_id: &str) {
        let result = self
            .backend
            .update(
                Table::Donations,
                status_patch(PaymentStatus::Failed),
                &Filter::all().eq("id", donation_id),
            )
            .await;
        if let Err(e) = result {
            tracing::warn!(%donation_id, error = %e, "could not mark cancelled donation as failed");
        }
    }

    /// Issue the certificate; failures are logged and never fail the donation
    async fn issue_certificate(&self, donation: &Donation) -> Option<Certificate> {
        let campaign_title = self.campaign_title(&donation.campaign_id).await;
        let donor_name = if donation.is_anonymous {
            None
        } else {
            donation.donor_name.clone()
        };
        let request = CertificateRequest::new(donation.id.clone(), donation.amount)
            .donor_id(donation.donor_id.clone())
            .donor_name(donor_name)
            .campaign_title(campaign_title);

        match self.certificates.generate(&request) {
            Ok(certificate) => Some(certificate),
            Err(e) => {
                tracing::warn!(donation_id = %donation.id, error = %e, "certificate generation failed");
                None
            }
        }
    }

    async fn campaign_title(&self, campaign_id: &str) -> Option<String> {
        let rows = self
            .backend
            .select(Table::Campaigns, &Filter::all().eq("id", campaign_id), None)
            .await;
        match rows {
            Ok(rows) => rows
                .into_iter()
                .next()
                .and_then(|row| row.get("title").and_then(|t| t.as_str()).map(str::to_string)),
            Err(e) => {
                tracing::warn!(%campaign_id, error = %e, "campaign lookup failed");
                None
            }
        }
    }
}

fn status_patch(status: PaymentStatus) -> Row {
    let mut patch = Row::new();
    patch.insert("payment_status".to_string(), json!(status.as_str()));
    patch
}
