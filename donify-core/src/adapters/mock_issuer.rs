//! Mock certificate issuer
//!
//! Fabricates certificate and token identifiers locally. Nothing is minted
//! and no ledger is contacted; identifiers are random, so uniqueness is
//! probabilistic.

use chrono::{Datelike, Utc};
use rand::distributions::Uniform;
use rand::Rng;
use uuid::Uuid;

use crate::domain::certificate::CERTIFICATE_TYPE;
use crate::domain::result::Result;
use crate::domain::{Certificate, CertificateAttribute, CertificateMetadata, CertificateRequest};
use crate::ports::CertificateIssuer;

pub const DEFAULT_NETWORK: &str = "Polygon Mumbai Testnet";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://example.com";

const OPENSEA_ASSETS_URL: &str = "https://testnets.opensea.io/assets/mumbai";
const CERTIFICATE_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone)]
pub struct MockCertificateIssuer {
    network: String,
    contract_address: Option<String>,
    currency_symbol: String,
    image_base_url: String,
}

impl Default for MockCertificateIssuer {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            contract_address: None,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }
}

impl MockCertificateIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Contract address; enables marketplace links on issued certificates
    pub fn contract_address(mut self, address: Option<String>) -> Self {
        self.contract_address = address.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// `CERT-<8 uppercase alphanumerics>-<year>`
pub fn generate_certificate_id(year: i32) -> String {
    let mut rng = rand::thread_rng();
    let dist = Uniform::from(0..CERTIFICATE_ID_ALPHABET.len());
    let suffix: String = (0..8)
        .map(|_| CERTIFICATE_ID_ALPHABET[rng.sample(dist)] as char)
        .collect();
    format!("CERT-{}-{}", suffix, year)
}

/// `TOKEN-<unix millis>-<0..999>`
pub fn generate_token_id() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1000);
    format!("TOKEN-{}-{}", Utc::now().timestamp_millis(), n)
}

impl CertificateIssuer for MockCertificateIssuer {
    fn network(&self) -> &str {
        &self.network
    }

    fn issue(&self, request: &CertificateRequest) -> Result<Certificate> {
        let now = Utc::now();
        let certificate_id = generate_certificate_id(now.year());
        let token_id = generate_token_id();
        let campaign = request.campaign_title.as_deref().unwrap_or("Campaign");
        let donor = request
            .donor_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Anonymous");

        let metadata = CertificateMetadata {
            name: format!("Donation Certificate #{}", certificate_id),
            description: format!("Certificate of donation to {}", campaign),
            image: format!("{}/certificate-template.png", self.image_base_url),
            attributes: vec![
                CertificateAttribute::new("Donor Name", donor),
                CertificateAttribute::new(
                    "Amount",
                    format!("{}{}", self.currency_symbol, request.amount.normalize()),
                ),
                CertificateAttribute::new("Campaign", campaign),
                CertificateAttribute::new("Donation Date", now.date_naive().to_string()),
                CertificateAttribute::new("Certificate Type", CERTIFICATE_TYPE),
            ],
            donation_id: request.donation_id.clone(),
            certificate_id: certificate_id.clone(),
            created_at: now,
        };

        let opensea_url = self
            .contract_address
            .as_ref()
            .map(|contract| format!("{}/{}/{}", OPENSEA_ASSETS_URL, contract, token_id));

        Ok(Certificate {
            id: Uuid::new_v4().to_string(),
            donation_id: request.donation_id.clone(),
            donor_id: request.donor_id.clone(),
            image_url: Some(format!("{}/certificates/{}.png", self.image_base_url, certificate_id)),
            certificate_id,
            token_id: Some(token_id),
            blockchain_network: self.network.clone(),
            contract_address: self.contract_address.clone(),
            metadata,
            opensea_url,
            minted_at: now,
            created_at: now,
        })
    }
}
