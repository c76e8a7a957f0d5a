use crate::models::RequestId;
use serde::{Deserialize, Serialize};

/// Events that move a sub-request through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SubRequestEvent {
    /// Start rewriting reference tokens
    Resolve,
    /// Hand the resolved request to its handler
    Dispatch,
    /// Record the sub-response with its status code
    Record(u16),
}

impl SubRequestEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Dispatch => "dispatch",
            Self::Record(_) => "record",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}

/// Events that close a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BatchEvent {
    Commit,
    /// Abort, citing the sub-request that caused it when there is one
    Abort(Option<RequestId>),
}

impl BatchEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Abort(_) => "abort",
        }
    }
}
