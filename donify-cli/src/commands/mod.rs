//! CLI command implementations

pub mod account;
pub mod admin;
pub mod campaigns;
pub mod certificates;
pub mod demo;
pub mod donate;
pub mod logs;
pub mod outreach;
pub mod wallet;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use donify_core::{DonifyContext, EntryPoint, Error, LogEvent, LoggingService};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize; logging never blocks a command.
pub fn get_logger() -> Option<LoggingService> {
    let donify_dir = get_donify_dir().ok()?;
    std::fs::create_dir_all(&donify_dir).ok()?;
    LoggingService::new(&donify_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Record a failed command; only the first line of the message is kept
pub fn log_error(logger: &Option<LoggingService>, command: &str, error: &anyhow::Error) {
    let message = error.to_string();
    let summary = message.lines().next().unwrap_or_default().to_string();
    log_event(
        logger,
        LogEvent::new("command_failed")
            .with_command(command)
            .with_error(summary),
    );
}

/// Data directory from `DONIFY_DIR`, else `~/.donify`
pub fn get_donify_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DONIFY_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".donify"))
        .ok_or_else(|| anyhow!("Could not find home directory; set DONIFY_DIR"))
}

/// Get or create the Donify context
pub fn get_context() -> Result<DonifyContext> {
    let donify_dir = get_donify_dir()?;
    std::fs::create_dir_all(&donify_dir)
        .with_context(|| format!("Failed to create donify directory: {:?}", donify_dir))?;
    DonifyContext::new(&donify_dir).context("Failed to initialize donify context")
}

/// Turn a core result into a CLI result, letting the context react first
pub fn check<T>(ctx: &DonifyContext, result: donify_core::domain::result::Result<T>) -> Result<T> {
    result.map_err(|e: Error| {
        ctx.handle_error(&e);
        anyhow::Error::new(e)
    })
}
