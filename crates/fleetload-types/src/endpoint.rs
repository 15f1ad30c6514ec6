//! Upstream endpoints and their extraction settings.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Cadence, TypeError};

/// One of the provider's data feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// Raw GPS position records.
    #[serde(rename = "EnvioIplan")]
    Iplan,
    /// Line reallocation events.
    #[serde(rename = "EnvioViagensRetroativas")]
    ViagensRetroativas,
    /// Consolidated trip records.
    #[serde(rename = "EnvioViagensConsolidadas")]
    ViagensConsolidadas,
}

impl Endpoint {
    /// Returns the endpoint name as stored in the control table.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Iplan => "EnvioIplan",
            Self::ViagensRetroativas => "EnvioViagensRetroativas",
            Self::ViagensConsolidadas => "EnvioViagensConsolidadas",
        }
    }

    /// Returns all known endpoints.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Iplan,
            Self::ViagensConsolidadas,
            Self::ViagensRetroativas,
        ]
    }

    /// Returns the default extraction settings for this endpoint.
    #[must_use]
    pub fn spec(&self) -> EndpointSpec {
        match self {
            Self::Iplan => EndpointSpec::new(*self, Cadence::minutes(5), "gps_registros"),
            Self::ViagensRetroativas => {
                EndpointSpec::new(*self, Cadence::hours(1), "gps_realocacoes")
            }
            Self::ViagensConsolidadas => {
                EndpointSpec::new(*self, Cadence::hours(1), "gps_viagens_consolidadas")
            }
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|endpoint| endpoint.as_str() == s)
            .copied()
            .ok_or_else(|| TypeError::UnknownEndpoint(s.to_string()))
    }
}

/// Extraction settings for one endpoint, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    /// The endpoint these settings apply to.
    pub endpoint: Endpoint,
    /// Window cadence.
    pub cadence: Cadence,
    /// Warehouse table the records are appended to.
    pub table: String,
}

impl EndpointSpec {
    /// Creates endpoint settings.
    #[must_use]
    pub fn new(endpoint: Endpoint, cadence: Cadence, table: impl Into<String>) -> Self {
        Self {
            endpoint,
            cadence,
            table: table.into(),
        }
    }

    /// Replaces the cadence.
    #[must_use]
    pub const fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }
}
