//! Admin command - dashboard figures, donor export and volunteer review

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;

use donify_core::domain::VolunteerStatus;

use super::{check, get_context};
use crate::output;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Show dashboard totals and recent donations
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export completed donations as CSV
    Export {
        /// Output file (defaults to donor-data-<date>.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List volunteer applications
    Volunteers {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Approve a volunteer application
    Approve { id: String },
    /// Reject a volunteer application
    Reject { id: String },
}

pub async fn run(command: AdminCommands) -> Result<()> {
    let ctx = get_context()?;
    let symbol = ctx.config.certificates.currency_symbol.clone();

    match command {
        AdminCommands::Stats { json } => {
            let stats = check(&ctx, ctx.admin.stats().await)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            println!("{}", "Dashboard".bold());
            let mut table = output::create_table();
            table.add_row(vec!["Total raised".to_string(), output::format_amount(&symbol, stats.total_raised)]);
            table.add_row(vec!["Donations".to_string(), stats.total_donations.to_string()]);
            table.add_row(vec!["Donors".to_string(), stats.total_donors.to_string()]);
            table.add_row(vec!["Active campaigns".to_string(), stats.active_campaigns.to_string()]);
            table.add_row(vec!["Volunteers".to_string(), stats.volunteers.to_string()]);
            table.add_row(vec!["Newsletter subscribers".to_string(), stats.newsletter_subscribers.to_string()]);
            println!("{}", table);

            if !stats.recent_donations.is_empty() {
                println!();
                println!("{}", "Recent donations".bold());
                let mut recent = output::create_table();
                recent.set_header(vec!["Date", "Donor", "Campaign", "Amount"]);
                for r in &stats.recent_donations {
                    recent.add_row(vec![
                        output::format_date(&r.donation.created_at),
                        r.donation.display_name().to_string(),
                        r.campaign_title.clone().unwrap_or_else(|| "-".to_string()),
                        output::format_amount(&symbol, r.donation.amount),
                    ]);
                }
                println!("{}", recent);
            }
        }
        AdminCommands::Export { output: path } => {
            let path = path.unwrap_or_else(|| {
                PathBuf::from(format!("donor-data-{}.csv", Utc::now().format("%Y-%m-%d")))
            });
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let rows = check(&ctx, ctx.admin.export_donors_csv(BufWriter::new(file)).await)?;
            output::success(&format!("Exported {} donations to {}", rows, path.display()));
        }
        AdminCommands::Volunteers { json } => {
            let volunteers = check(&ctx, ctx.admin.list_volunteers().await)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&volunteers)?);
                return Ok(());
            }
            if volunteers.is_empty() {
                println!("No volunteer applications.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["ID", "Name", "Email", "Skills", "Status", "Applied"]);
            for v in &volunteers {
                let status = match v.status {
                    VolunteerStatus::Pending => v.status.as_str().yellow(),
                    VolunteerStatus::Approved => v.status.as_str().green(),
                    VolunteerStatus::Rejected => v.status.as_str().red(),
                };
                table.add_row(vec![
                    v.id.clone(),
                    v.full_name.clone(),
                    v.email.clone(),
                    v.skills.clone().unwrap_or_default(),
                    status.to_string(),
                    output::format_date(&v.created_at),
                ]);
            }
            println!("{}", table);
        }
        AdminCommands::Approve { id } => {
            check(&ctx, ctx.admin.set_volunteer_status(&id, VolunteerStatus::Approved).await)?;
            output::success("Volunteer approved");
        }
        AdminCommands::Reject { id } => {
            check(&ctx, ctx.admin.set_volunteer_status(&id, VolunteerStatus::Rejected).await)?;
            output::warning("Volunteer rejected");
        }
    }
    Ok(())
}
