//! Campaign domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Categories a campaign can be filed under
pub const CATEGORIES: &[&str] = &[
    "Education",
    "Healthcare",
    "Emergency",
    "Environment",
    "Water",
    "Food",
    "Other",
];

/// Smallest fundraising goal accepted for a new campaign
pub const MIN_GOAL_AMOUNT: i64 = 100;

pub const STATUS_ACTIVE: &str = "active";

/// A fundraising campaign as stored in the backend `campaigns` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub goal_amount: Decimal,
    #[serde(default)]
    pub raised_amount: Option<Decimal>,
    pub category: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn raised(&self) -> Decimal {
        self.raised_amount.unwrap_or(Decimal::ZERO)
    }

    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some(STATUS_ACTIVE)
    }

    /// Funding progress in percent, capped at 100
    pub fn progress_percent(&self) -> f64 {
        if self.goal_amount <= Decimal::ZERO {
            return 0.0;
        }
        let pct = (self.raised() / self.goal_amount * Decimal::from(100))
            .to_f64()
            .unwrap_or(0.0);
        pct.clamp(0.0, 100.0)
    }

    /// Days left until the end date, if one is set and not passed
    pub fn days_left(&self, today: NaiveDate) -> Option<i64> {
        self.end_date
            .map(|end| (end - today).num_days())
            .filter(|days| *days >= 0)
    }
}

/// Input for starting a new campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampaign {
    pub title: String,
    pub description: String,
    pub goal_amount: Decimal,
    pub category: String,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
}

impl NewCampaign {
    /// Validate the form; messages are user facing
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().chars().count() < 5 {
            return Err("Title must be at least 5 characters".to_string());
        }
        if self.goal_amount < Decimal::from(MIN_GOAL_AMOUNT) {
            return Err(format!("Goal amount must be at least {}", MIN_GOAL_AMOUNT));
        }
        if !CATEGORIES
            .iter()
            .any(|c| c.eq_ignore_ascii_case(self.category.trim()))
        {
            return Err(format!(
                "Please select a category ({})",
                CATEGORIES.join(", ")
            ));
        }
        if self.description.trim().chars().count() < 20 {
            return Err("Description must be at least 20 characters".to_string());
        }
        let start = self.start_date.unwrap_or_else(|| Utc::now().date_naive());
        if self.end_date <= start {
            return Err("End date must be after the start date".to_string());
        }
        Ok(())
    }

    /// Build the row to insert, with the category normalized to its canonical case
    pub fn into_campaign(self, created_by: Option<String>) -> Campaign {
        let category = CATEGORIES
            .iter()
            .find(|c| c.eq_ignore_ascii_case(self.category.trim()))
            .map(|c| c.to_string())
            .unwrap_or(self.category);
        Campaign {
            id: Uuid::new_v4().to_string(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            image_url: self.image_url,
            goal_amount: self.goal_amount,
            raised_amount: Some(Decimal::ZERO),
            category,
            location: self.location,
            status: Some(STATUS_ACTIVE.to_string()),
            start_date: Some(self.start_date.unwrap_or_else(|| Utc::now().date_naive())),
            end_date: Some(self.end_date),
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// Sort orders offered by the campaign browser
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignSort {
    #[default]
    Newest,
    MostFunded,
    GoalAmount,
}

/// Client-side browsing filter
#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: CampaignSort,
}

impl CampaignFilter {
    pub fn matches(&self, campaign: &Campaign) -> bool {
        if let Some(category) = self.category.as_deref() {
            if !category.eq_ignore_ascii_case("all") && !campaign.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref() {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty()
                && !campaign.title.to_lowercase().contains(&needle)
                && !campaign.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    /// Filter and sort a list of campaigns
    pub fn apply(&self, campaigns: Vec<Campaign>) -> Vec<Campaign> {
        let mut matched: Vec<Campaign> = campaigns.into_iter().filter(|c| self.matches(c)).collect();
        match self.sort {
            CampaignSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            CampaignSort::MostFunded => matched.sort_by(|a, b| {
                b.progress_percent()
                    .partial_cmp(&a.progress_percent())
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            CampaignSort::GoalAmount => matched.sort_by(|a, b| b.goal_amount.cmp(&a.goal_amount)),
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(title: &str, category: &str, goal: i64, raised: i64) -> Campaign {
        Campaign {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: format!("{} description", title),
            image_url: None,
            goal_amount: Decimal::from(goal),
            raised_amount: Some(Decimal::from(raised)),
            category: category.to_string(),
            location: None,
            status: Some(STATUS_ACTIVE.to_string()),
            start_date: None,
            end_date: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    fn new_campaign() -> NewCampaign {
        NewCampaign {
            title: "Clean water for schools".to_string(),
            description: "Install filters in twenty rural schools.".to_string(),
            goal_amount: Decimal::from(5000),
            category: "water".to_string(),
            location: Some("Pune".to_string()),
            image_url: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_progress_percent_is_capped() {
        assert_eq!(campaign("A", "Water", 1000, 250).progress_percent(), 25.0);
        assert_eq!(campaign("A", "Water", 1000, 5000).progress_percent(), 100.0);
        assert_eq!(campaign("A", "Water", 0, 10).progress_percent(), 0.0);
    }

    #[test]
    fn test_new_campaign_validation() {
        assert!(new_campaign().validate().is_ok());

        let mut short = new_campaign();
        short.title = "Tiny".to_string();
        assert!(short.validate().is_err());

        let mut small_goal = new_campaign();
        small_goal.goal_amount = Decimal::from(99);
        assert!(small_goal.validate().is_err());

        let mut bad_category = new_campaign();
        bad_category.category = "Sports".to_string();
        assert!(bad_category.validate().is_err());

        let mut backwards = new_campaign();
        backwards.end_date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn test_into_campaign_normalizes_category() {
        let campaign = new_campaign().into_campaign(Some("user-1".to_string()));
        assert_eq!(campaign.category, "Water");
        assert!(campaign.is_active());
        assert_eq!(campaign.raised(), Decimal::ZERO);
    }

    #[test]
    fn test_filter_by_category_and_search() {
        let campaigns = vec![
            campaign("School books", "Education", 1000, 10),
            campaign("Flood relief", "Emergency", 1000, 900),
            campaign("Village well", "Water", 1000, 500),
        ];
        let filter = CampaignFilter {
            category: Some("emergency".to_string()),
            ..Default::default()
        };
        let result = filter.apply(campaigns.clone());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Flood relief");

        let filter = CampaignFilter {
            search: Some("WELL".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(campaigns.clone()).len(), 1);

        let filter = CampaignFilter {
            sort: CampaignSort::MostFunded,
            ..Default::default()
        };
        let sorted = filter.apply(campaigns);
        assert_eq!(sorted[0].title, "Flood relief");
        assert_eq!(sorted[2].title, "School books");
    }
}
