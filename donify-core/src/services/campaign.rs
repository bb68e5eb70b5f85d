//! Campaign service - browse and start campaigns

use std::sync::Arc;

use crate::domain::campaign::STATUS_ACTIVE;
use crate::domain::result::{Error, Result};
use crate::domain::{Campaign, CampaignFilter, NewCampaign};
use crate::ports::backend::{from_row, from_rows, to_row};
use crate::ports::{BackendStore, Filter, Order, Table};

pub struct CampaignService {
    backend: Arc<dyn BackendStore>,
}

impl CampaignService {
    pub fn new(backend: Arc<dyn BackendStore>) -> Self {
        Self { backend }
    }

    /// Active campaigns, newest first
    pub async fn list_active(&self) -> Result<Vec<Campaign>> {
        let rows = self
            .backend
            .select(
                Table::Campaigns,
                &Filter::all().eq("status", STATUS_ACTIVE),
                Some(&Order::desc("created_at")),
            )
            .await?;
        from_rows(rows)
    }

    pub async fn get(&self, id: &str) -> Result<Campaign> {
        let rows = self
            .backend
            .select(Table::Campaigns, &Filter::all().eq("id", id), None)
            .await?;
        match rows.into_iter().next() {
            Some(row) => from_row(row),
            None => Err(Error::not_found(format!("campaign {}", id))),
        }
    }

    /// Active campaigns narrowed and sorted by a browsing filter
    pub async fn browse(&self, filter: &CampaignFilter) -> Result<Vec<Campaign>> {
        Ok(filter.apply(self.list_active().await?))
    }

    /// Validate and store a new campaign owned by the current user
    pub async fn create(&self, new_campaign: NewCampaign) -> Result<Campaign> {
        new_campaign.validate().map_err(Error::Validation)?;
        let created_by = self.backend.current_user().await?.map(|identity| identity.id);
        let campaign = new_campaign.into_campaign(created_by);
        let stored = self
            .backend
            .insert(Table::Campaigns, to_row(&campaign)?)
            .await?;
        tracing::debug!(campaign_id = %campaign.id, "campaign created");
        from_row(stored)
    }
}
