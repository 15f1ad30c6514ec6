//! Upstream telemetry providers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Endpoint, TypeError};

/// A supported upstream telemetry provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Zirix GPS telemetry.
    #[default]
    Zirix,
}

impl Provider {
    /// Returns the provider name as stored in the control table.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Zirix => "zirix",
        }
    }

    /// Returns the endpoints served by this provider.
    #[must_use]
    pub const fn endpoints(&self) -> &'static [Endpoint] {
        match self {
            Self::Zirix => Endpoint::all(),
        }
    }

    /// Returns the secret id holding this provider's API key.
    #[must_use]
    pub const fn api_key_secret(&self) -> &'static str {
        match self {
            Self::Zirix => "api_key_zirix",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zirix" => Ok(Self::Zirix),
            _ => Err(TypeError::UnknownProvider(s.to_string())),
        }
    }
}
