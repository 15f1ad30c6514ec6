//! One-shot extraction command.

use anyhow::{Context, Result, bail};
use fleetload_extract::{EnvSecretStore, invoke};
use fleetload_types::ExtractionWindow;
use std::path::PathBuf;

use super::load_settings;

/// Execute the run command.
pub(crate) async fn run(
    warehouse_dir: Option<PathBuf>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let mut settings = load_settings(warehouse_dir)?;

    if let (Some(start), Some(end)) = (start, end) {
        let window = ExtractionWindow::parse(start, end).context("Invalid backfill window")?;
        settings = settings.with_override_window(Some(window));
    }

    let invocation = invoke(&settings, &EnvSecretStore::from_env()).await;
    if !invocation.is_success() {
        bail!(invocation.message);
    }

    println!("{}", invocation.message);
    Ok(())
}
