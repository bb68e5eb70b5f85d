//! Demo command - manage demo mode

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_donify_dir;
use donify_core::services::DemoService;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode with fresh sample data
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off {
        /// Also delete the demo database
        #[arg(long)]
        clean: bool,
    },
    /// Show demo mode status
    Status,
}

pub async fn run(command: Option<DemoCommands>) -> Result<()> {
    let donify_dir = get_donify_dir()?;
    std::fs::create_dir_all(&donify_dir)?;
    let demo_service = DemoService::new(&donify_dir);

    match command {
        Some(DemoCommands::On) => {
            demo_service.enable().await?;
            println!("{}", "Demo mode enabled".green());
            println!("Sample campaigns are ready. Run 'dfy campaigns' to browse them.");
        }
        Some(DemoCommands::Off { clean }) => {
            demo_service.disable(clean)?;
            println!("{}", "Demo mode disabled".yellow());
        }
        Some(DemoCommands::Status) | None => {
            if demo_service.is_enabled()? {
                println!("Demo mode is {}", "ON".green());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
        }
    }
    Ok(())
}
