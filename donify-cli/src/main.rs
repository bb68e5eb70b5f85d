//! Donify CLI - donate to campaigns from your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{account, admin, campaigns, certificates, demo, donate, logs, outreach, wallet};

/// Donify - fundraising campaigns, donations and certificates
#[derive(Parser)]
#[command(name = "dfy", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Signup {
        /// Full name
        #[arg(long)]
        name: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long, env = "DONIFY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign in to an existing account
    Signin {
        /// Email address
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long, env = "DONIFY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out and clear the stored session
    Signout,

    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Connect a wallet
    Wallet {
        #[command(subcommand)]
        command: Option<wallet::WalletCommands>,
    },

    /// Browse and start campaigns
    Campaigns {
        #[command(subcommand)]
        command: Option<campaigns::CampaignCommands>,
    },

    /// Donate to a campaign
    Donate(donate::DonateArgs),

    /// List donation certificates
    Certificates {
        #[command(subcommand)]
        command: Option<certificates::CertificateCommands>,
    },

    /// Subscribe an email address to the newsletter
    Newsletter {
        /// Email address
        email: String,
    },

    /// Apply as a volunteer
    Volunteer(outreach::VolunteerArgs),

    /// Admin dashboard
    Admin {
        #[command(subcommand)]
        command: admin::AdminCommands,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },

    /// Inspect the local event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    /// Command name recorded in the event log
    fn name(&self) -> &'static str {
        match self {
            Commands::Signup { .. } => "signup",
            Commands::Signin { .. } => "signin",
            Commands::Signout => "signout",
            Commands::Whoami { .. } => "whoami",
            Commands::Wallet { .. } => "wallet",
            Commands::Campaigns { .. } => "campaigns",
            Commands::Donate(_) => "donate",
            Commands::Certificates { .. } => "certificates",
            Commands::Newsletter { .. } => "newsletter",
            Commands::Volunteer(_) => "volunteer",
            Commands::Admin { .. } => "admin",
            Commands::Demo { .. } => "demo",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DONIFY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let logger = commands::get_logger();
    let name = cli.command.name();
    if let Some(l) = &logger {
        let _ = l.log_command(name);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_error(&logger, name, &e);
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Signup { name, email, password } => account::sign_up(&name, &email, password),
        Commands::Signin { email, password, json } => account::sign_in(&email, password, json),
        Commands::Signout => account::sign_out(),
        Commands::Whoami { json } => account::whoami(json),
        Commands::Wallet { command } => wallet::run(command).await,
        Commands::Campaigns { command } => campaigns::run(command).await,
        Commands::Donate(args) => donate::run(args).await,
        Commands::Certificates { command } => certificates::run(command),
        Commands::Newsletter { email } => outreach::subscribe(&email).await,
        Commands::Volunteer(args) => outreach::volunteer(args).await,
        Commands::Admin { command } => admin::run(command).await,
        Commands::Demo { command } => demo::run(command).await,
        Commands::Logs { command } => logs::run(command),
    }
}
