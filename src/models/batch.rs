use super::sub_request::{RequestId, SubRequest};
use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How failures inside a batch are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Best effort: every sub-request commits on its own, failures are recorded per item
    #[default]
    Independent,
    /// All or nothing: the whole batch runs in one unit of work
    EnclosingTransaction,
}

impl ExecutionMode {
    pub fn from_enclosing_transaction(enclosing: bool) -> Self {
        if enclosing {
            Self::EnclosingTransaction
        } else {
            Self::Independent
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Self::EnclosingTransaction)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Independent => write!(f, "independent"),
            Self::EnclosingTransaction => write!(f, "enclosing_transaction"),
        }
    }
}

/// Check batch-level invariants before anything executes.
///
/// `max_batch_size` of zero disables the size limit.
pub fn validate_batch(requests: &[SubRequest], max_batch_size: usize) -> Result<(), BatchError> {
    if max_batch_size > 0 && requests.len() > max_batch_size {
        return Err(BatchError::InvalidBatch(format!(
            "batch contains {} requests, the limit is {max_batch_size}",
            requests.len()
        )));
    }

    let mut seen: HashSet<RequestId> = HashSet::with_capacity(requests.len());
    for request in requests {
        if !seen.insert(request.request_id) {
            return Err(BatchError::InvalidBatch(format!(
                "duplicate requestId {}",
                request.request_id
            )));
        }
    }

    Ok(())
}
