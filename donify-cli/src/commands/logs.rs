//! Logs command - view and manage the event log

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use super::get_donify_dir;
use crate::output;
use donify_core::{EntryPoint, LoggingService};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Print the newest events first
    List {
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Only events that carry an error
        #[arg(long)]
        errors: bool,
        #[arg(long)]
        json: bool,
    },
    /// Delete events recorded before a cutoff
    Clear {
        /// Age in days; newer events are kept
        #[arg(long = "older-than", default_value = "30")]
        days: u64,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
        #[arg(long)]
        json: bool,
    },
    /// Event counts and where the log lives
    Stats {
        #[arg(long)]
        json: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let donify_dir = get_donify_dir()?;
    std::fs::create_dir_all(&donify_dir)?;
    LoggingService::new(&donify_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    let service = get_logging_service()?;

    match command {
        LogsCommands::List { limit, errors, json } => {
            let entries = if errors {
                service.get_errors(limit)?
            } else {
                service.get_recent(limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("Nothing logged yet.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Entry", "Event", "Context", "Error"]);
            for entry in entries {
                let context = [entry.command.as_deref(), entry.subject.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(", ");
                let error = entry
                    .error_message
                    .as_deref()
                    .map(|m| m.red().to_string())
                    .unwrap_or_default();

                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    entry.entry_point,
                    entry.event,
                    context,
                    error,
                ]);
            }
            println!("{}", table);
        }
        LogsCommands::Clear { days, yes, json } => {
            let cutoff = Utc::now() - chrono::Duration::days(days as i64);

            if !yes && !json {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete events older than {} days?", days))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let deleted = service.delete_before(cutoff.timestamp_millis())?;
            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Removed {} events", deleted));
            }
        }
        LogsCommands::Stats { json } => {
            let total = service.count()?;
            let errors = service.count_errors()?;
            let path = service.db_path();
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "events": total,
                        "errors": errors,
                        "path": path.to_string_lossy(),
                        "sizeBytes": size,
                    })
                );
                return Ok(());
            }

            let mut table = output::create_table();
            table.add_row(vec!["Events".to_string(), total.to_string()]);
            table.add_row(vec!["Errors".to_string(), errors.to_string()]);
            table.add_row(vec!["File".to_string(), path.display().to_string()]);
            table.add_row(vec!["Size".to_string(), format!("{} KiB", size.div_ceil(1024))]);
            println!("{}", table);
        }
    }
    Ok(())
}
