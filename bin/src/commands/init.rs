//! Control table initialization command.

use anyhow::{Context, Result};
use fleetload_warehouse::ControlTable;
use std::path::PathBuf;

use super::{load_settings, open_warehouse};

/// Execute the init command.
pub(crate) async fn init(warehouse_dir: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(warehouse_dir)?;
    let warehouse = open_warehouse(&settings)?;
    let control = ControlTable::new(&warehouse, settings.control_table_ref());

    let seeded = control
        .ensure_initialized(settings.provider)
        .await
        .context("Failed to initialize control table")?;

    if seeded {
        println!(
            "Seeded control table {} with {} endpoint(s) for {}",
            control.table(),
            settings.provider.endpoints().len(),
            settings.provider
        );
    } else {
        println!(
            "Control table {} already has rows for {}",
            control.table(),
            settings.provider
        );
    }
    Ok(())
}
