use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one sub-request within a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubRequestState {
    /// Not reached yet
    #[default]
    Pending,
    /// Reference tokens in URL and body are being rewritten
    Resolving,
    /// Routed to a handler and executing inside a unit of work
    Dispatching,
    /// A sub-response (success or error-shaped) has been recorded
    Recorded,
}

impl SubRequestState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Recorded)
    }
}

impl fmt::Display for SubRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Resolving => write!(f, "resolving"),
            Self::Dispatching => write!(f, "dispatching"),
            Self::Recorded => write!(f, "recorded"),
        }
    }
}

impl std::str::FromStr for SubRequestState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "resolving" => Ok(Self::Resolving),
            "dispatching" => Ok(Self::Dispatching),
            "recorded" => Ok(Self::Recorded),
            _ => Err(format!("Invalid sub-request state: {s}")),
        }
    }
}

/// Lifecycle of a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    #[default]
    Running,
    /// Every sub-request has been recorded and its effects are durable
    Committed,
    /// Execution stopped early and the enclosing unit of work was discarded
    Aborted,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Aborted)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Committed => write!(f, "committed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

impl std::str::FromStr for BatchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "committed" => Ok(Self::Committed),
            "aborted" => Ok(Self::Aborted),
            _ => Err(format!("Invalid batch state: {s}")),
        }
    }
}
