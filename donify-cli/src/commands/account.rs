//! Account commands - sign up, sign in, sign out, whoami

use anyhow::Result;
use colored::Colorize;
use dialoguer::Password;
use donify_core::domain::AuthState;
use donify_core::services::format_address;

use super::{check, get_context};
use crate::output;

fn password_or_prompt(password: Option<String>, confirm: bool) -> Result<String> {
    if let Some(p) = password {
        return Ok(p);
    }
    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

pub fn sign_up(name: &str, email: &str, password: Option<String>) -> Result<()> {
    let ctx = get_context()?;
    let password = password_or_prompt(password, true)?;
    let user = check(&ctx, ctx.session.sign_up(name, email, &password))?;
    output::success(&format!("Welcome, {}! Your account is ready.", user.name));
    Ok(())
}

pub fn sign_in(email: &str, password: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let password = password_or_prompt(password, false)?;
    let outcome = check(&ctx, ctx.session.sign_in(email, &password))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.to_response())?);
        return Ok(());
    }

    match check(&ctx, outcome.into_result())? {
        Some(user) => output::success(&format!("Signed in as {}", user.name)),
        None => {
            output::warning("No account found for this email.");
            println!("Create one with: dfy signup --name <NAME> --email {}", email);
        }
    }
    Ok(())
}

pub fn sign_out() -> Result<()> {
    let ctx = get_context()?;
    check(&ctx, ctx.session.sign_out())?;
    output::info("Signed out");
    Ok(())
}

pub fn whoami(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let state = ctx.session.auth_state();

    if json {
        println!("{}", serde_json::to_string_pretty(&state.user())?);
        return Ok(());
    }

    match state {
        AuthState::Authenticated(user) => {
            println!("{}", user.name.bold());
            println!("  Email:  {}", user.email);
            if let Some(address) = &user.wallet_address {
                println!("  Wallet: {}", format_address(address));
            }
            println!("  Member since {}", output::format_date(&user.created_at));
        }
        AuthState::Anonymous | AuthState::Loading => {
            println!("Not signed in. Run 'dfy signin --email <EMAIL>'.");
        }
    }
    Ok(())
}
