//! Donation certificate domain model
//!
//! Certificates are simulated NFTs: identifiers are fabricated locally and
//! no ledger is involved. The field names match the JSON documents kept in
//! the local certificate list.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed certificate type attribute
pub const CERTIFICATE_TYPE: &str = "One-time Donation";

/// A single NFT-style metadata attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateAttribute {
    pub trait_type: String,
    pub value: String,
}

impl CertificateAttribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Metadata document attached to a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<CertificateAttribute>,
    pub donation_id: String,
    pub certificate_id: String,
    pub created_at: DateTime<Utc>,
}

impl CertificateMetadata {
    /// Look up an attribute value by trait type
    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }
}

/// A donation certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String,
    pub donation_id: String,
    #[serde(default)]
    pub donor_id: Option<String>,
    pub certificate_id: String,
    #[serde(default)]
    pub token_id: Option<String>,
    pub blockchain_network: String,
    #[serde(default)]
    pub contract_address: Option<String>,
    pub metadata: CertificateMetadata,
    #[serde(default)]
    pub opensea_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub minted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Input for certificate generation
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateRequest {
    pub donation_id: String,
    pub donor_id: Option<String>,
    pub donor_name: Option<String>,
    pub campaign_title: Option<String>,
    pub amount: Decimal,
}

impl CertificateRequest {
    pub fn new(donation_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            donation_id: donation_id.into(),
            donor_id: None,
            donor_name: None,
            campaign_title: None,
            amount,
        }
    }

    pub fn donor_id(mut self, donor_id: Option<String>) -> Self {
        self.donor_id = donor_id;
        self
    }

    pub fn donor_name(mut self, donor_name: Option<String>) -> Self {
        self.donor_name = donor_name;
        self
    }

    pub fn campaign_title(mut self, campaign_title: Option<String>) -> Self {
        self.campaign_title = campaign_title;
        self
    }
}
