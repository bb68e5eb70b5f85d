//! Demo service - manage demo mode
//!
//! Demo mode swaps the local backend for `demo.duckdb`, seeded with sample
//! campaigns, donations and volunteers. The real database is left alone.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::adapters::demo::{generate_demo_campaigns, generate_demo_donations, generate_demo_volunteers};
use crate::adapters::DuckDbBackend;
use crate::config::Config;
use crate::ports::backend::to_row;
use crate::ports::{BackendStore, Table};

pub const DEMO_DB_FILENAME: &str = "demo.duckdb";

pub struct DemoService {
    donify_dir: PathBuf,
}

impl DemoService {
    pub fn new(donify_dir: &Path) -> Self {
        Self {
            donify_dir: donify_dir.to_path_buf(),
        }
    }

    pub fn is_enabled(&self) -> Result<bool> {
        Ok(Config::load(&self.donify_dir)?.demo_mode)
    }

    fn remove_demo_database(&self) -> Result<()> {
        for name in [DEMO_DB_FILENAME.to_string(), format!("{}.wal", DEMO_DB_FILENAME)] {
            let path = self.donify_dir.join(name);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }

    /// Turn demo mode on with a freshly seeded demo database
    pub async fn enable(&self) -> Result<()> {
        self.remove_demo_database()?;

        let mut config = Config::load(&self.donify_dir).unwrap_or_default();
        config.enable_demo_mode();
        config.save(&self.donify_dir)?;

        let backend = DuckDbBackend::open(&self.donify_dir.join(DEMO_DB_FILENAME))
            .context("Failed to create demo database")?;
        seed(&backend).await?;
        tracing::debug!("demo database seeded");
        Ok(())
    }

    /// Turn demo mode off; `clean` also deletes the demo database
    pub fn disable(&self, clean: bool) -> Result<()> {
        let mut config = Config::load(&self.donify_dir).unwrap_or_default();
        config.disable_demo_mode();
        config.save(&self.donify_dir)?;

        if clean {
            self.remove_demo_database()?;
        }
        Ok(())
    }
}

async fn seed(backend: &dyn BackendStore) -> Result<()> {
    for campaign in generate_demo_campaigns() {
        backend.insert(Table::Campaigns, to_row(&campaign)?).await?;
    }
    for donation in generate_demo_donations() {
        backend.insert(Table::Donations, to_row(&donation)?).await?;
    }
    for volunteer in generate_demo_volunteers() {
        backend.insert(Table::Volunteers, to_row(&volunteer)?).await?;
    }
    Ok(())
}
