//! Control table status command.

use anyhow::{Context, Result};
use chrono::Utc;
use fleetload_types::format_timestamp;
use fleetload_warehouse::{ControlTable, Warehouse};
use std::path::PathBuf;

use super::{load_settings, open_warehouse};

/// Execute the status command.
pub(crate) async fn status(warehouse_dir: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(warehouse_dir)?;
    let warehouse = open_warehouse(&settings)?;
    let control = ControlTable::new(&warehouse, settings.control_table_ref())
        .with_backoff_minutes(settings.backoff_minutes);

    let records = control
        .records(settings.provider.as_str())
        .await
        .with_context(|| format!("Failed to read control table {}", control.table()))?;

    if records.is_empty() {
        println!("No control rows for {}", settings.provider);
        return Ok(());
    }

    let now = Utc::now();
    println!("Control table {}.{}\n", warehouse.project(), control.table());
    println!(
        "{:<28} {:<8} {:<20} {:<8}",
        "ENDPOINT", "STATUS", "LAST EXTRACTION", "ELIGIBLE"
    );
    println!("{}", "-".repeat(67));

    for record in &records {
        println!(
            "{:<28} {:<8} {:<20} {:<8}",
            record.endpoint,
            record.status.as_str(),
            record
                .last_extraction
                .map_or_else(|| "-".to_string(), format_timestamp),
            if control.is_eligible(record, now) { "yes" } else { "no" }
        );
    }

    println!(
        "\n{} endpoint(s), backoff {} minute(s)",
        records.len(),
        control.backoff_minutes()
    );
    Ok(())
}
