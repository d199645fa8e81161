//! Process run mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which halves of the service a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// HTTP read API and ingestion consumer in one process.
    #[default]
    All,
    /// HTTP read API only.
    Api,
    /// Ingestion consumer only.
    Ingest,
}

impl RunMode {
    /// Returns true if this process serves the HTTP API.
    #[must_use]
    pub const fn serves_api(&self) -> bool {
        matches!(self, Self::All | Self::Api)
    }

    /// Returns true if this process consumes the broker.
    #[must_use]
    pub const fn consumes(&self) -> bool {
        matches!(self, Self::All | Self::Ingest)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Api => write!(f, "api"),
            Self::Ingest => write!(f, "ingest"),
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "api" => Ok(Self::Api),
            "ingest" => Ok(Self::Ingest),
            _ => Err(format!("Unknown run mode: {s}")),
        }
    }
}
