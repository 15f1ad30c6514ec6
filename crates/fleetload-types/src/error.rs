//! Error types for fleetload domain types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for domain type operations.
pub type Result<T> = std::result::Result<T, TypeError>;

/// Errors raised while parsing or validating domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// Endpoint name not recognized.
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// Provider name not recognized.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Extraction status not recognized.
    #[error("Unknown extraction status: {0}")]
    UnknownStatus(String),

    /// Invalid extraction window.
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// Error for invalid extraction windows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// End is not strictly after start.
    #[error("Invalid extraction window: {start} >= {end}")]
    Empty {
        /// The window start.
        start: DateTime<Utc>,
        /// The window end.
        end: DateTime<Utc>,
    },

    /// Timestamp text did not match `YYYY-MM-DD HH:MM:SS`.
    #[error("Invalid timestamp '{0}', expected YYYY-MM-DD HH:MM:SS")]
    Timestamp(String),
}
