//! Volunteer and newsletter domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::validate_email;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolunteerStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VolunteerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolunteerStatus::Pending => "pending",
            VolunteerStatus::Approved => "approved",
            VolunteerStatus::Rejected => "rejected",
        }
    }
}

/// A volunteer application row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: VolunteerStatus,
    pub created_at: DateTime<Utc>,
}

/// Volunteer sign-up form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolunteerApplication {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: Option<String>,
    pub availability: Option<String>,
    pub message: Option<String>,
}

impl VolunteerApplication {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.full_name.trim().is_empty() {
            return Err("Please provide your full name");
        }
        validate_email(&self.email)
    }

    pub fn into_volunteer(self) -> Volunteer {
        Volunteer {
            id: Uuid::new_v4().to_string(),
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone,
            skills: self.skills,
            availability: self.availability,
            message: self.message,
            status: VolunteerStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// A newsletter subscription row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterSubscriber {
    pub id: String,
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl NewsletterSubscriber {
    pub fn new(email: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

fn default_active() -> bool {
    true
}
