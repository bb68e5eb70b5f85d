//! Admin service - dashboard figures, donor export, volunteer review

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::domain::campaign::STATUS_ACTIVE;
use crate::domain::result::{Error, Result};
use crate::domain::{Campaign, Donation, NewsletterSubscriber, PaymentStatus, Volunteer, VolunteerStatus};
use crate::ports::backend::from_rows;
use crate::ports::{BackendStore, Filter, Order, Row, Table};

/// Number of donations shown in the recent list
const RECENT_DONATIONS: usize = 10;

/// A completed donation with its campaign title resolved
#[derive(Debug, Clone, Serialize)]
pub struct RecentDonation {
    pub donation: Donation,
    pub campaign_title: Option<String>,
}

/// Dashboard figures; donation figures count completed donations only
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_raised: Decimal,
    pub total_donations: usize,
    pub active_campaigns: usize,
    pub total_donors: usize,
    pub volunteers: usize,
    pub newsletter_subscribers: usize,
    pub recent_donations: Vec<RecentDonation>,
}

pub struct AdminService {
    backend: Arc<dyn BackendStore>,
}

impl AdminService {
    pub fn new(backend: Arc<dyn BackendStore>) -> Self {
        Self { backend }
    }

    async fn completed_donations(&self) -> Result<Vec<Donation>> {
        let rows = self
            .backend
            .select(
                Table::Donations,
                &Filter::all().eq("payment_status", PaymentStatus::Completed.as_str()),
                Some(&Order::desc("created_at")),
            )
            .await?;
        from_rows(rows)
    }

    async fn campaign_titles(&self) -> Result<HashMap<String, String>> {
        let campaigns: Vec<Campaign> = from_rows(
            self.backend
                .select(Table::Campaigns, &Filter::all(), None)
                .await?,
        )?;
        Ok(campaigns.into_iter().map(|c| (c.id, c.title)).collect())
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        let donations = self.completed_donations().await?;
        let titles = self.campaign_titles().await?;
        let active_campaigns = self
            .backend
            .select(Table::Campaigns, &Filter::all().eq("status", STATUS_ACTIVE), None)
            .await?
            .len();
        let volunteers = self.list_volunteers().await?.len();
        let subscribers: Vec<NewsletterSubscriber> = from_rows(
            self.backend
                .select(
                    Table::NewsletterSubscribers,
                    &Filter::all().eq("is_active", true),
                    None,
                )
                .await?,
        )?;

        let total_raised = donations.iter().map(|d| d.amount).sum();
        // Donors are identified by account id, falling back to email
        let total_donors = donations
            .iter()
            .filter_map(|d| d.donor_id.clone().or_else(|| d.donor_email.as_deref().map(str::to_lowercase)))
            .collect::<HashSet<_>>()
            .len();
        let total_donations = donations.len();
        let recent_donations = donations
            .into_iter()
            .take(RECENT_DONATIONS)
            .map(|donation| RecentDonation {
                campaign_title: titles.get(&donation.campaign_id).cloned(),
                donation,
            })
            .collect();

        Ok(DashboardStats {
            total_raised,
            total_donations,
            active_campaigns,
            total_donors,
            volunteers,
            newsletter_subscribers: subscribers.len(),
            recent_donations,
        })
    }

    /// Volunteer applications, newest first
    pub async fn list_volunteers(&self) -> Result<Vec<Volunteer>> {
        let rows = self
            .backend
            .select(Table::Volunteers, &Filter::all(), Some(&Order::desc("created_at")))
            .await?;
        from_rows(rows)
    }

    /// Approve or reject a volunteer application
    pub async fn set_volunteer_status(&self, id: &str, status: VolunteerStatus) -> Result<()> {
        if status == VolunteerStatus::Pending {
            return Err(Error::validation("Status must be approved or rejected"));
        }
        let filter = Filter::all().eq("id", id);
        if self
            .backend
            .select(Table::Volunteers, &filter, None)
            .await?
            .is_empty()
        {
            return Err(Error::not_found(format!("volunteer {}", id)));
        }
        let mut patch = Row::new();
        patch.insert("status".to_string(), json!(status.as_str()));
        self.backend.update(Table::Volunteers, patch, &filter).await?;
        tracing::debug!(volunteer_id = %id, status = status.as_str(), "volunteer status updated");
        Ok(())
    }

    /// Write completed donations as CSV; returns the number of data rows
    pub async fn export_donors_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let donations = self.completed_donations().await?;
        let titles = self.campaign_titles().await?;

        let mut csv = csv::Writer::from_writer(writer);
        let csv_err = |e: csv::Error| Error::Other(format!("CSV export failed: {}", e));
        csv.write_record(["Donor Name", "Email", "Amount", "Date", "Campaign"])
            .map_err(csv_err)?;
        for donation in &donations {
            let email = if donation.is_anonymous {
                ""
            } else {
                donation.donor_email.as_deref().unwrap_or("")
            };
            csv.write_record([
                donation.display_name().to_string(),
                email.to_string(),
                donation.amount.normalize().to_string(),
                donation.created_at.date_naive().to_string(),
                titles.get(&donation.campaign_id).cloned().unwrap_or_default(),
            ])
            .map_err(csv_err)?;
        }
        csv.flush()?;
        Ok(donations.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::demo::{generate_demo_campaigns, generate_demo_donations, generate_demo_volunteers};
    use crate::adapters::DuckDbBackend;
    use crate::ports::backend::to_row;

    async fn seeded() -> (AdminService, Arc<DuckDbBackend>) {
        let backend = Arc::new(DuckDbBackend::open_in_memory().unwrap());
        for c in generate_demo_campaigns() {
            backend.insert(Table::Campaigns, to_row(&c).unwrap()).await.unwrap();
        }
        for d in generate_demo_donations() {
            backend.insert(Table::Donations, to_row(&d).unwrap()).await.unwrap();
        }
        for v in generate_demo_volunteers() {
            backend.insert(Table::Volunteers, to_row(&v).unwrap()).await.unwrap();
        }
        backend
            .insert(Table::NewsletterSubscribers, to_row(&NewsletterSubscriber::new("a@x.com")).unwrap())
            .await
            .unwrap();
        (AdminService::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_stats_count_completed_only() {
        let (admin, backend) = seeded().await;
        let mut pending = generate_demo_donations().remove(0);
        pending.id = "pending-1".to_string();
        pending.payment_status = PaymentStatus::Pending;
        pending.amount = Decimal::new(99999, 0);
        backend.insert(Table::Donations, to_row(&pending).unwrap()).await.unwrap();

        let stats = admin.stats().await.unwrap();
        let expected: Decimal = generate_demo_donations().iter().map(|d| d.amount).sum();
        assert_eq!(stats.total_raised, expected);
        assert_eq!(stats.total_donations, 8);
        assert_eq!(stats.active_campaigns, 6);
        // Priya donated twice; the two anonymous donations have no email
        assert_eq!(stats.total_donors, 5);
        assert_eq!(stats.volunteers, 3);
        assert_eq!(stats.newsletter_subscribers, 1);
        assert_eq!(stats.recent_donations.len(), 8);
        assert!(stats.recent_donations.iter().all(|r| r.campaign_title.is_some()));
    }

    #[tokio::test]
    async fn test_export_csv() {
        let (admin, _) = seeded().await;
        let mut out = Vec::new();
        let rows = admin.export_donors_csv(&mut out).await.unwrap();
        assert_eq!(rows, 8);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Donor Name,Email,Amount,Date,Campaign"));
        assert!(text.contains("Anonymous,,10000,"));
        assert!(text.contains("Priya Sharma,priya@example.com,5000,"));
        assert_eq!(lines.count(), 8);
    }

    #[tokio::test]
    async fn test_set_volunteer_status() {
        let (admin, _) = seeded().await;
        let id = "vvvvvvvv-0000-0000-0000-000000000002";
        admin.set_volunteer_status(id, VolunteerStatus::Approved).await.unwrap();
        let updated = admin.list_volunteers().await.unwrap();
        assert_eq!(
            updated.iter().find(|v| v.id == id).unwrap().status,
            VolunteerStatus::Approved
        );

        assert!(matches!(
            admin.set_volunteer_status("missing", VolunteerStatus::Rejected).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            admin.set_volunteer_status(id, VolunteerStatus::Pending).await,
            Err(Error::Validation(_))
        ));
    }
}
