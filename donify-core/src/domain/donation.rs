//! Donation domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the donor pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Upi,
    Paypal,
    Crypto,
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "paypal" => Ok(Self::Paypal),
            "crypto" => Ok(Self::Crypto),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringFrequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl FromStr for RecurringFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(format!("unknown recurring frequency: {}", other)),
        }
    }
}

/// Payment state of a donation row: pending, then completed or failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A donation row as stored in the backend `donations` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: String,
    pub campaign_id: String,
    #[serde(default)]
    pub donor_id: Option<String>,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_frequency: Option<RecurringFrequency>,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub donor_email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Build a pending donation from a validated form
    pub fn pending(form: &DonationForm, amount: Decimal, donor_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            campaign_id: form.campaign_id.trim().to_string(),
            donor_id,
            amount,
            payment_method: form.payment_method,
            is_anonymous: form.is_anonymous,
            is_recurring: form.is_recurring,
            recurring_frequency: if form.is_recurring {
                form.recurring_frequency
            } else {
                None
            },
            donor_name: non_empty(form.donor_name.as_deref()),
            donor_email: non_empty(form.donor_email.as_deref()),
            message: non_empty(form.message.as_deref()),
            payment_status: PaymentStatus::Pending,
            transaction_id: Some(generate_transaction_id()),
            created_at: Utc::now(),
        }
    }

    /// Name to show publicly ("Anonymous" for anonymous donations)
    pub fn display_name(&self) -> &str {
        if self.is_anonymous {
            return "Anonymous";
        }
        self.donor_name.as_deref().unwrap_or("Anonymous")
    }
}

/// Donation form input, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationForm {
    pub campaign_id: String,
    /// `None` when the amount field was left empty or did not parse
    pub amount: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub is_anonymous: bool,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub message: Option<String>,
}

impl DonationForm {
    /// Start a form for a campaign with a raw amount field
    pub fn new(campaign_id: impl Into<String>, amount: &str) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            amount: parse_amount(amount),
            payment_method: PaymentMethod::Card,
            is_anonymous: false,
            is_recurring: false,
            recurring_frequency: None,
            donor_name: None,
            donor_email: None,
            message: None,
        }
    }

    pub fn donor(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.donor_name = Some(name.into());
        self.donor_email = Some(email.into());
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.is_anonymous = true;
        self
    }

    pub fn recurring(mut self, frequency: RecurringFrequency) -> Self {
        self.is_recurring = true;
        self.recurring_frequency = Some(frequency);
        self
    }

    pub fn payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Validate the form, returning the accepted amount
    ///
    /// Messages are user facing.
    pub fn validate(&self) -> Result<Decimal, &'static str> {
        if self.campaign_id.trim().is_empty() {
            return Err("Please choose a campaign");
        }
        let amount = match self.amount {
            Some(amount) if amount > Decimal::ZERO && amount.normalize().scale() <= 2 => amount,
            _ => return Err("Please enter a valid donation amount"),
        };
        if !self.is_anonymous
            && (non_empty(self.donor_name.as_deref()).is_none()
                || non_empty(self.donor_email.as_deref()).is_none())
        {
            return Err("Please provide your name and email");
        }
        if self.is_recurring && self.recurring_frequency.is_none() {
            return Err("Please choose how often to repeat the donation");
        }
        Ok(amount)
    }
}

/// Parse a raw amount field; empty or malformed input yields `None`
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw).ok()
}

/// Stages of the donation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStage {
    Idle,
    Validating,
    Submitting,
    AwaitingPaymentConfirmation,
    Completed,
    Failed,
}

impl DonationStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DonationStage::Completed | DonationStage::Failed)
    }
}

/// `TXN_<unix millis>_<9 base36 chars>`
pub fn generate_transaction_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("TXN_{}_{}", Utc::now().timestamp_millis(), suffix)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
