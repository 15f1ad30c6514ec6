//! CLI command implementations.

use anyhow::{Context, Result};
use fleetload_extract::Settings;
use fleetload_warehouse::LocalWarehouse;
use std::path::PathBuf;

pub(crate) mod init;
pub(crate) mod run;
pub(crate) mod serve;
pub(crate) mod status;

/// Reads settings from the environment, applying the command-line override.
fn load_settings(warehouse_dir: Option<PathBuf>) -> Result<Settings> {
    let settings = Settings::from_env().context("Invalid configuration")?;
    if warehouse_dir.is_some() {
        return Ok(settings.with_warehouse_dir(warehouse_dir));
    }
    Ok(settings)
}

/// Opens the local warehouse named by `settings`.
fn open_warehouse(settings: &Settings) -> Result<LocalWarehouse> {
    match &settings.warehouse_dir {
        Some(root) => LocalWarehouse::new(root.clone(), settings.project.clone())
            .with_context(|| format!("Failed to open warehouse at {}", root.display())),
        None => LocalWarehouse::with_default_path(settings.project.clone()).with_context(|| {
            format!(
                "Failed to open warehouse at {}",
                LocalWarehouse::default_path().display()
            )
        }),
    }
}
