//! Settings resolved once at start-up.

use fleetload_fetch::{ClientConfig, EndpointPaths};
use fleetload_types::{Endpoint, ExtractionWindow, Provider, TypeError, WindowError};
use fleetload_warehouse::{DEFAULT_BACKOFF_MINUTES, TableRef};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors in the process configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    /// A variable has a value that cannot be used.
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// The offending value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The provider is not supported.
    #[error(transparent)]
    UnknownProvider(#[from] TypeError),

    /// The backfill window is malformed.
    #[error("Invalid backfill window: {0}")]
    Window(#[from] WindowError),

    /// Only one end of the backfill window was given.
    #[error("START_DATE and END_DATE must be set together")]
    PartialWindow,

    /// A secret could not be found.
    #[error("Secret '{0}' not found")]
    MissingSecret(String),
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Upstream provider.
    pub provider: Provider,
    /// Base URL of the upstream API.
    pub base_url: String,
    /// Path of each endpoint under the base URL.
    pub paths: EndpointPaths,
    /// Id of the secret holding the API key.
    pub api_key_secret: String,
    /// Warehouse project.
    pub project: String,
    /// Warehouse dataset holding the control and data tables.
    pub dataset: String,
    /// Control table name.
    pub control_table: String,
    /// Root of the local warehouse; the platform data directory when unset.
    pub warehouse_dir: Option<PathBuf>,
    /// Attempts per request.
    pub retries: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// Minutes between extractions of the same endpoint.
    pub backoff_minutes: i64,
    /// Manual backfill window applied to every endpoint.
    pub override_window: Option<ExtractionWindow>,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is
    /// invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };
        let require = |name: &'static str, aliases: &[&str]| {
            let mut names = vec![name];
            names.extend_from_slice(aliases);
            get(&names).ok_or(ConfigError::Missing(name))
        };

        let provider: Provider = get(&["PROVIDER"])
            .map_or(Ok(Provider::default()), |value| value.parse())?;

        let mut paths = EndpointPaths::default();
        for (name, endpoint) in [
            ("ENDPOINT_REGISTROS", Endpoint::Iplan),
            ("ENDPOINT_REALOCACAO", Endpoint::ViagensRetroativas),
            ("ENDPOINT_VIAGENS_CONSOLIDADAS", Endpoint::ViagensConsolidadas),
        ] {
            if let Some(path) = get(&[name]) {
                paths = paths.with(endpoint, path);
            }
        }

        let retries = parse_number("RETRIES", get(&["RETRIES"]), 3_u32)?;
        if retries == 0 {
            return Err(invalid("RETRIES", "0", "must be at least 1"));
        }

        let timeout_secs = parse_number("TIMEOUT_IN_SECONDS", get(&["TIMEOUT_IN_SECONDS"]), 300_u64)?;
        if timeout_secs == 0 {
            return Err(invalid("TIMEOUT_IN_SECONDS", "0", "must be positive"));
        }

        let backoff_minutes = parse_number(
            "BACKOFF_MINUTES",
            get(&["BACKOFF_MINUTES"]),
            DEFAULT_BACKOFF_MINUTES,
        )?;

        let override_window = match (get(&["START_DATE"]), get(&["END_DATE"])) {
            (Some(start), Some(end)) => Some(ExtractionWindow::parse(&start, &end)?),
            (None, None) => None,
            _ => return Err(ConfigError::PartialWindow),
        };

        Ok(Self {
            provider,
            base_url: require("API_BASE_URL", &["URL"])?,
            paths,
            api_key_secret: get(&["API_KEY_SECRET_ID"])
                .unwrap_or_else(|| provider.api_key_secret().to_string()),
            project: require("WAREHOUSE_PROJECT", &["GOOGLE_CLOUD_PROJECT"])?,
            dataset: require("WAREHOUSE_DATASET", &["GOOGLE_CLOUD_DATASET"])?,
            control_table: get(&["WAREHOUSE_CONTROL_TABLE", "GOOGLE_CLOUD_CONTROL_TABLE"])
                .unwrap_or_else(|| "control_table".to_string()),
            warehouse_dir: get(&["WAREHOUSE_DIR"]).map(PathBuf::from),
            retries,
            timeout: Duration::from_secs(timeout_secs),
            backoff_minutes,
            override_window,
        })
    }

    /// Replaces the backfill window.
    #[must_use]
    pub const fn with_override_window(mut self, window: Option<ExtractionWindow>) -> Self {
        self.override_window = window;
        self
    }

    /// Replaces the warehouse root.
    #[must_use]
    pub fn with_warehouse_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.warehouse_dir = dir;
        self
    }

    /// HTTP client configuration for the upstream API.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            retries: self.retries,
            timeout: self.timeout,
            ..ClientConfig::new(self.base_url.clone())
        }
    }

    /// The control table.
    #[must_use]
    pub fn control_table_ref(&self) -> TableRef {
        TableRef::new(self.dataset.clone(), self.control_table.clone())
    }
}

fn parse_number<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |value| {
        value
            .parse()
            .map_err(|e: T::Err| invalid(name, &value, &e.to_string()))
    })
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
