//! Certificate service - issue and look up donation certificates
//!
//! Certificates are kept in an append-only JSON list under the
//! `donation_certificates` key. A donation gets at most one certificate:
//! asking again returns the one already stored.

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{Certificate, CertificateRequest};
use crate::ports::key_value::{encode_list, keys, load_list};
use crate::ports::{CertificateIssuer, KeyValueStore};

const MAX_CAS_ATTEMPTS: usize = 32;

pub struct CertificateService {
    store: Arc<dyn KeyValueStore>,
    issuer: Arc<dyn CertificateIssuer>,
}

impl CertificateService {
    pub fn new(store: Arc<dyn KeyValueStore>, issuer: Arc<dyn CertificateIssuer>) -> Self {
        Self { store, issuer }
    }

    pub fn network(&self) -> &str {
        self.issuer.network()
    }

    /// Issue and store a certificate for a completed donation
    pub fn generate(&self, request: &CertificateRequest) -> Result<Certificate> {
        if request.donation_id.trim().is_empty() {
            return Err(Error::Certificate("donation id is required".to_string()));
        }

        for _ in 0..MAX_CAS_ATTEMPTS {
            let doc = load_list::<Certificate>(self.store.as_ref(), keys::CERTIFICATES)?;
            if let Some(existing) = doc
                .items
                .iter()
                .find(|c| c.donation_id == request.donation_id)
            {
                tracing::debug!(
                    donation_id = %request.donation_id,
                    certificate_id = %existing.certificate_id,
                    "donation already has a certificate"
                );
                return Ok(existing.clone());
            }

            let certificate = self.issuer.issue(request)?;
            let mut items = doc.items;
            items.push(certificate.clone());
            let encoded = encode_list(&items)?;
            if self
                .store
                .compare_and_swap(keys::CERTIFICATES, doc.raw.as_deref(), &encoded)?
            {
                tracing::debug!(
                    donation_id = %request.donation_id,
                    certificate_id = %certificate.certificate_id,
                    "certificate issued"
                );
                return Ok(certificate);
            }
        }
        Err(Error::Certificate(
            "certificate list is changing too quickly, try again".to_string(),
        ))
    }

    /// All certificates in insertion order
    pub fn list(&self) -> Result<Vec<Certificate>> {
        Ok(load_list(self.store.as_ref(), keys::CERTIFICATES)?.items)
    }

    /// Exact match on the human-readable certificate id
    pub fn get_by_id(&self, certificate_id: &str) -> Result<Option<Certificate>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|c| c.certificate_id == certificate_id))
    }

    pub fn list_for_donor(&self, donor_id: &str) -> Result<Vec<Certificate>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|c| c.donor_id.as_deref() == Some(donor_id))
            .collect())
    }
}
