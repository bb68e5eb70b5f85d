//! Wallet command - connect the configured wallet and link it to the account

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use donify_core::services::format_address;
use donify_core::LogEvent;

use super::{check, get_context, get_logger, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Ask the wallet for an account and link it to the signed-in user
    Connect {
        /// Show the full address
        #[arg(long)]
        full: bool,
    },
    /// Show wallet availability and the linked address
    Status,
}

pub async fn run(command: Option<WalletCommands>) -> Result<()> {
    let ctx = get_context()?;

    match command {
        Some(WalletCommands::Connect { full }) => {
            let address = check(&ctx, ctx.wallet.connect().await)?;
            let shown = if full { address.clone() } else { format_address(&address) };
            output::success(&format!("Wallet connected: {}", shown));

            match check(&ctx, ctx.session.link_wallet(&address))? {
                Some(_) => println!("Linked to your account."),
                None => println!("Sign in to link this wallet to your account."),
            }
            log_event(&get_logger(), LogEvent::new("wallet_connected").with_subject("wallet"));
        }
        Some(WalletCommands::Status) | None => {
            if !ctx.wallet.is_available() {
                println!("Wallet: {}", "not configured".yellow());
                println!("Add an account under wallet.accounts in settings.json or set DONIFY_WALLET_ADDRESS.");
            } else if check(&ctx, ctx.wallet.check_connected().await)?.is_some() {
                println!("Wallet: {}", "connected".green());
            } else {
                println!("Wallet: {}", "available".cyan());
            }
            match ctx.session.current_user().and_then(|u| u.wallet_address) {
                Some(address) => println!("Linked address: {}", format_address(&address)),
                None => println!("Linked address: none"),
            }
        }
    }
    Ok(())
}
