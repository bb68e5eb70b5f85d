//! Certificate issuer port
//!
//! Synthesizes a certificate for a completed donation. The shipped issuer
//! is a local mock; a real chain integration would implement the same trait.

use crate::domain::result::Result;
use crate::domain::{Certificate, CertificateRequest};

pub trait CertificateIssuer: Send + Sync {
    /// Network label written into issued certificates
    fn network(&self) -> &str;

    /// Build a certificate for the request; must not persist anything
    fn issue(&self, request: &CertificateRequest) -> Result<Certificate>;
}
