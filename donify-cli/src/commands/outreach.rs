//! Outreach commands - newsletter sign-up and volunteer applications

use anyhow::Result;
use clap::Args;
use donify_core::domain::VolunteerApplication;
use donify_core::Error;

use super::{check, get_context};
use crate::output;

#[derive(Args)]
pub struct VolunteerArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
    /// Skills you can offer
    #[arg(long)]
    pub skills: Option<String>,
    /// When you are available
    #[arg(long)]
    pub availability: Option<String>,
    #[arg(long)]
    pub message: Option<String>,
}

pub async fn subscribe(email: &str) -> Result<()> {
    let ctx = get_context()?;
    match ctx.outreach.subscribe_newsletter(email).await {
        Ok(_) => output::success("Subscribed! Watch your inbox for campaign updates."),
        Err(Error::AlreadySubscribed) => output::info("This email is already subscribed."),
        Err(e) => return check(&ctx, Err(e)),
    }
    Ok(())
}

pub async fn volunteer(args: VolunteerArgs) -> Result<()> {
    let ctx = get_context()?;
    let application = VolunteerApplication {
        full_name: args.name,
        email: args.email,
        phone: args.phone,
        skills: args.skills,
        availability: args.availability,
        message: args.message,
    };
    check(&ctx, ctx.outreach.register_volunteer(application).await)?;
    output::success("Thank you for applying! We'll be in touch soon.");
    Ok(())
}
