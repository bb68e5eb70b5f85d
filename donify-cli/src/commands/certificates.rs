//! Certificates command - list and inspect donation certificates

use anyhow::{anyhow, Result};
use clap::Subcommand;
use colored::Colorize;

use super::{check, get_context};
use crate::output;

#[derive(Subcommand)]
pub enum CertificateCommands {
    /// List certificates
    List {
        /// Only certificates of the signed-in user
        #[arg(long)]
        mine: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one certificate by its CERT- id
    Show {
        certificate_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: Option<CertificateCommands>) -> Result<()> {
    let ctx = get_context()?;

    match command.unwrap_or(CertificateCommands::List { mine: false, json: false }) {
        CertificateCommands::List { mine, json } => {
            let certificates = if mine {
                let user = ctx
                    .session
                    .current_user()
                    .ok_or_else(|| anyhow!("Sign in to see your certificates"))?;
                check(&ctx, ctx.certificates.list_for_donor(&user.id))?
            } else {
                check(&ctx, ctx.certificates.list())?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&certificates)?);
                return Ok(());
            }
            if certificates.is_empty() {
                println!("No certificates yet.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Certificate", "Campaign", "Amount", "Network", "Issued"]);
            for cert in &certificates {
                let meta = &cert.metadata;
                table.add_row(vec![
                    cert.certificate_id.clone(),
                    meta.attribute("Campaign").unwrap_or("-").to_string(),
                    meta.attribute("Amount").unwrap_or("-").to_string(),
                    cert.blockchain_network.clone(),
                    output::format_date(&cert.created_at),
                ]);
            }
            println!("{}", table);
        }
        CertificateCommands::Show { certificate_id, json } => {
            let cert = check(&ctx, ctx.certificates.get_by_id(&certificate_id))?
                .ok_or_else(|| anyhow!("Certificate not found: {}", certificate_id))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cert)?);
                return Ok(());
            }

            println!("{}", cert.metadata.name.bold());
            println!("{}", cert.metadata.description);
            println!();
            for attr in &cert.metadata.attributes {
                println!("  {:<18} {}", format!("{}:", attr.trait_type).dimmed(), attr.value);
            }
            println!();
            println!("Network:  {}", cert.blockchain_network);
            if let Some(token) = &cert.token_id {
                println!("Token:    {}", token);
            }
            if let Some(url) = &cert.opensea_url {
                println!("View:     {}", url);
            }
        }
    }
    Ok(())
}
