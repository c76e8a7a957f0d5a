use crate::models::{RequestId, SubRequest, SubResponse};
use std::collections::{HashMap, HashSet};

/// What the ledger knows about a request id
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedgerEntry<'a> {
    /// Executed successfully, its response can be referenced
    Produced(&'a SubResponse),
    /// Executed and failed
    Failed,
    /// Part of the batch but not executed yet
    Pending,
    /// Not part of the batch
    Unknown,
}

/// Per-batch mapping from request id to produced sub-response.
///
/// Private to one batch execution and only ever appended to.
#[derive(Debug, Clone, Default)]
pub struct ResponseLedger {
    batch_ids: HashSet<RequestId>,
    produced: HashMap<RequestId, SubResponse>,
    failed: HashSet<RequestId>,
}

impl ResponseLedger {
    pub fn for_batch(requests: &[SubRequest]) -> Self {
        Self {
            batch_ids: requests.iter().map(|request| request.request_id).collect(),
            produced: HashMap::with_capacity(requests.len()),
            failed: HashSet::new(),
        }
    }

    pub fn record_success(&mut self, response: SubResponse) {
        self.produced.insert(response.request_id, response);
    }

    pub fn record_failure(&mut self, request_id: RequestId) {
        self.failed.insert(request_id);
    }

    pub fn lookup(&self, request_id: RequestId) -> LedgerEntry<'_> {
        if let Some(response) = self.produced.get(&request_id) {
            LedgerEntry::Produced(response)
        } else if self.failed.contains(&request_id) {
            LedgerEntry::Failed
        } else if self.batch_ids.contains(&request_id) {
            LedgerEntry::Pending
        } else {
            LedgerEntry::Unknown
        }
    }

    /// Number of requests recorded so far, successful or not
    pub fn recorded(&self) -> usize {
        self.produced.len() + self.failed.len()
    }
}
