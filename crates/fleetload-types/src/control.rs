//! Control table rows.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::TypeError;

/// Outcome of the last extraction attempt for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    /// The last attempt loaded data.
    Success,
    /// The last attempt failed or returned nothing.
    Failed,
}

impl ExtractionStatus {
    /// Returns the status as stored in the control table.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractionStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(TypeError::UnknownStatus(s.to_string())),
        }
    }
}

/// One row of the control table, unique per `(api, endpoint)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRecord {
    /// Provider name.
    pub api: String,
    /// Endpoint name.
    pub endpoint: String,
    /// Time of the last extraction attempt that moved the boundary.
    pub last_extraction: Option<DateTime<Utc>>,
    /// Outcome of the last attempt.
    pub status: ExtractionStatus,
}

impl ControlRecord {
    /// Creates a control record.
    #[must_use]
    pub fn new(
        api: impl Into<String>,
        endpoint: impl Into<String>,
        last_extraction: Option<DateTime<Utc>>,
        status: ExtractionStatus,
    ) -> Self {
        Self {
            api: api.into(),
            endpoint: endpoint.into(),
            last_extraction,
            status,
        }
    }

    /// Returns true if this record has the given key.
    #[must_use]
    pub fn has_key(&self, api: &str, endpoint: &str) -> bool {
        self.api == api && self.endpoint == endpoint
    }

    /// Time elapsed since the last extraction, if there was one.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.last_extraction.map(|last| now - last)
    }
}
