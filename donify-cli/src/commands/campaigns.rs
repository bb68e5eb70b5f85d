//! Campaigns command - browse, inspect and start campaigns

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use rust_decimal::Decimal;

use donify_core::domain::{CampaignFilter, CampaignSort, NewCampaign};

use super::{check, get_context};
use crate::output;

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    Newest,
    MostFunded,
    Goal,
}

impl From<SortArg> for CampaignSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Newest => CampaignSort::Newest,
            SortArg::MostFunded => CampaignSort::MostFunded,
            SortArg::Goal => CampaignSort::GoalAmount,
        }
    }
}

#[derive(Subcommand)]
pub enum CampaignCommands {
    /// List active campaigns
    List {
        /// Only campaigns in this category
        #[arg(long)]
        category: Option<String>,
        /// Match title or description
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long, value_enum, default_value = "newest")]
        sort: SortArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one campaign
    Show {
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start a new campaign
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Fundraising goal
        #[arg(long)]
        goal: String,
        #[arg(long)]
        category: String,
        /// Last day of the campaign (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
}

pub async fn run(command: Option<CampaignCommands>) -> Result<()> {
    let ctx = get_context()?;
    let symbol = ctx.config.certificates.currency_symbol.clone();
    let today = Utc::now().date_naive();

    match command.unwrap_or(CampaignCommands::List {
        category: None,
        search: None,
        sort: SortArg::Newest,
        json: false,
    }) {
        CampaignCommands::List { category, search, sort, json } => {
            let filter = CampaignFilter {
                category,
                search,
                sort: sort.into(),
            };
            let campaigns = check(&ctx, ctx.campaigns.browse(&filter).await)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&campaigns)?);
                return Ok(());
            }
            if campaigns.is_empty() {
                println!("No campaigns found. Try 'dfy demo on' for sample data.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["ID", "Title", "Category", "Raised", "Goal", "Progress", "Days left"]);
            for c in &campaigns {
                table.add_row(vec![
                    c.id.chars().take(8).collect::<String>(),
                    c.title.clone(),
                    c.category.clone(),
                    output::format_amount(&symbol, c.raised()),
                    output::format_amount(&symbol, c.goal_amount),
                    format!("{} {:.0}%", output::progress_bar(c.progress_percent(), 10), c.progress_percent()),
                    c.days_left(today).map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{}", table);
        }
        CampaignCommands::Show { id, json } => {
            let campaign = check(&ctx, ctx.campaigns.get(&id).await)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&campaign)?);
                return Ok(());
            }

            println!("{}", campaign.title.bold());
            println!("{}", campaign.category.dimmed());
            println!();
            println!("{}", campaign.description);
            println!();
            println!(
                "{} raised of {} goal",
                output::format_amount(&symbol, campaign.raised()).green(),
                output::format_amount(&symbol, campaign.goal_amount)
            );
            println!("{} {:.0}%", output::progress_bar(campaign.progress_percent(), 30), campaign.progress_percent());
            if let Some(location) = &campaign.location {
                println!("Location: {}", location);
            }
            if let Some(days) = campaign.days_left(today) {
                println!("{} days left", days);
            }
            println!();
            println!("Donate with: dfy donate {} --amount <AMOUNT>", campaign.id);
        }
        CampaignCommands::Create {
            title,
            description,
            goal,
            category,
            end_date,
            location,
            image_url,
        } => {
            let goal_amount: Decimal = goal
                .trim()
                .parse()
                .with_context(|| format!("Invalid goal amount: {}", goal))?;
            let end_date = NaiveDate::parse_from_str(&end_date, "%Y-%m-%d")
                .with_context(|| format!("Invalid end date (expected YYYY-MM-DD): {}", end_date))?;

            let campaign = check(
                &ctx,
                ctx.campaigns
                    .create(NewCampaign {
                        title,
                        description,
                        goal_amount,
                        category,
                        location,
                        image_url,
                        start_date: Some(today),
                        end_date,
                    })
                    .await,
            )?;
            output::success(&format!("Campaign created: {}", campaign.title));
            println!("ID: {}", campaign.id);
        }
    }
    Ok(())
}
