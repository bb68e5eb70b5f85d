//! Donate command - run a donation through the payment workflow

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use donify_core::domain::{DonationForm, DonationStage, PaymentMethod, RecurringFrequency};
use donify_core::LogEvent;

use super::{get_context, get_logger, log_event};
use crate::output;

#[derive(Args)]
pub struct DonateArgs {
    /// Campaign to donate to
    pub campaign_id: String,
    #[arg(long, short)]
    pub amount: String,
    /// Donor name (defaults to the signed-in user)
    #[arg(long)]
    pub name: Option<String>,
    /// Donor email (defaults to the signed-in user)
    #[arg(long)]
    pub email: Option<String>,
    /// Hide your name on the donation and certificate
    #[arg(long)]
    pub anonymous: bool,
    /// Repeat the donation: monthly, quarterly or yearly
    #[arg(long)]
    pub recurring: Option<RecurringFrequency>,
    /// card, upi, paypal or crypto
    #[arg(long, default_value = "card")]
    pub method: PaymentMethod,
    #[arg(long)]
    pub message: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn stage_message(stage: DonationStage) -> &'static str {
    match stage {
        DonationStage::Idle => "Preparing",
        DonationStage::Validating => "Checking your details",
        DonationStage::Submitting => "Recording donation",
        DonationStage::AwaitingPaymentConfirmation => "Waiting for payment confirmation (Ctrl-C to cancel)",
        DonationStage::Completed => "Issuing certificate",
        DonationStage::Failed => "Failed",
    }
}

pub async fn run(args: DonateArgs) -> Result<()> {
    let ctx = get_context()?;
    let user = ctx.session.current_user();

    let mut form = DonationForm::new(args.campaign_id, &args.amount).payment_method(args.method);
    form.donor_name = args.name.or_else(|| user.as_ref().map(|u| u.name.clone()));
    form.donor_email = args.email.or_else(|| user.as_ref().map(|u| u.email.clone()));
    if args.anonymous {
        form = form.anonymous();
    }
    if let Some(frequency) = args.recurring {
        form = form.recurring(frequency);
    }
    if let Some(message) = args.message {
        form = form.message(message);
    }

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let progress = {
        let spinner = spinner.clone();
        let mut stages = ctx.donations.stage();
        tokio::spawn(async move {
            while stages.changed().await.is_ok() {
                let stage = *stages.borrow_and_update();
                spinner.set_message(stage_message(stage));
                if stage.is_terminal() {
                    break;
                }
            }
        })
    };

    let result = ctx.donations.submit(&form, &cancel).await;
    spinner.finish_and_clear();
    progress.abort();
    ctrl_c.abort();

    let logger = get_logger();
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(failure) => {
            ctx.handle_error(&failure.error);
            log_event(
                &logger,
                LogEvent::new("donation_failed")
                    .with_subject("donation")
                    .with_error(format!("{:?}", failure.failed_at)),
            );
            return Err(anyhow!(failure.error));
        }
    };
    log_event(&logger, LogEvent::new("donation_completed").with_subject("donation"));

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "donation": outcome.donation,
                "certificate": outcome.certificate,
            }))?
        );
        return Ok(());
    }

    let symbol = &ctx.config.certificates.currency_symbol;
    output::success(&format!(
        "Thank you! Your donation of {} is complete.",
        output::format_amount(symbol, outcome.donation.amount)
    ));
    if let Some(txn) = &outcome.donation.transaction_id {
        println!("Transaction: {}", txn.dimmed());
    }
    match &outcome.certificate {
        Some(cert) => {
            println!("Certificate: {}", cert.certificate_id.bold());
            if let Some(url) = &cert.opensea_url {
                println!("View: {}", url);
            }
        }
        None => output::warning("The certificate could not be issued; your donation was still recorded."),
    }
    Ok(())
}
