//! Request-driven entry point.

use fleetload_fetch::{ApiClient, RecordSource, TelemetryProvider};
use fleetload_warehouse::{LocalWarehouse, Warehouse};
use tracing::{error, info};

use crate::{CycleReport, Extractor, Result, Scheduler, SecretStore, Settings};

/// Status and message returned to whoever triggered a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// HTTP-style status code: 200 or 500.
    pub status: u16,
    /// Short human-readable outcome.
    pub message: String,
}

impl Invocation {
    /// Returns true for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    fn ok(message: &str) -> Self {
        Self {
            status: 200,
            message: message.to_string(),
        }
    }

    fn failed(error: &dyn std::fmt::Display) -> Self {
        Self {
            status: 500,
            message: format!("Error during execution: {error}"),
        }
    }
}

impl From<Result<CycleReport>> for Invocation {
    fn from(result: Result<CycleReport>) -> Self {
        match result {
            Ok(report) if report.is_noop() => Self::ok("No eligible endpoints found"),
            Ok(_) => Self::ok("Data processed successfully"),
            Err(e) => {
                error!(error = %e, "execution failed");
                Self::failed(&e)
            }
        }
    }
}

/// Builds the production extractor: the provider's HTTP API feeding the
/// local warehouse.
///
/// # Errors
///
/// Returns an error if the API key is missing, the HTTP client cannot be
/// built or the warehouse cannot be opened.
pub fn build_extractor(
    settings: &Settings,
    secrets: &dyn SecretStore,
) -> Result<Extractor<TelemetryProvider, LocalWarehouse>> {
    let api_key = secrets.secret(&settings.api_key_secret)?;
    let client = ApiClient::new(settings.client_config())?;
    let source = TelemetryProvider::new(
        settings.provider,
        client,
        api_key,
        settings.paths.clone(),
    );

    let root = settings
        .warehouse_dir
        .clone()
        .unwrap_or_else(LocalWarehouse::default_path);
    let warehouse = LocalWarehouse::new(root, settings.project.clone())?;
    info!(
        provider = %settings.provider,
        warehouse = %warehouse.root().display(),
        project = %settings.project,
        dataset = %settings.dataset,
        "extractor ready"
    );

    Ok(Extractor::new(
        settings.provider,
        source,
        warehouse,
        settings.control_table_ref(),
    )
    .with_backoff_minutes(settings.backoff_minutes)
    .with_scheduler(Scheduler::new().with_override(settings.override_window)))
}

/// Runs one cycle and summarizes it.
pub async fn execute<S: RecordSource, W: Warehouse>(extractor: &Extractor<S, W>) -> Invocation {
    extractor.run().await.into()
}

/// Builds an extractor from `settings` and runs one cycle.
///
/// Never fails: errors become a 500 [`Invocation`] and are logged.
pub async fn invoke(settings: &Settings, secrets: &dyn SecretStore) -> Invocation {
    match build_extractor(settings, secrets) {
        Ok(extractor) => execute(&extractor).await,
        Err(e) => {
            error!(error = %e, "could not start extraction");
            Invocation::failed(&e)
        }
    }
}
