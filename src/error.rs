//! Error types for batch orchestration.
//!
//! Per sub-request failures ([`ResolutionError`], [`DispatchError`],
//! [`HandlerError`]) never escape the engine as faults: they become
//! error-shaped sub-responses in independent mode or a
//! [`BatchError::Aborted`] in enclosing-transaction mode.
//! [`TransactionError`] is fatal to the batch in both modes.

use crate::constants::{error_types, status};
use crate::models::{HttpMethod, RequestId};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// A reference token could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("request {request_id}: malformed reference token '{token}': {reason}")]
    MalformedToken {
        request_id: RequestId,
        token: String,
        reason: String,
    },

    #[error("request {request_id}: token '{token}' names no target and the request declares no reference")]
    MissingReference { request_id: RequestId, token: String },

    #[error("request {request_id}: token '{token}' targets request {target} but only the declared reference {declared} may be used")]
    UndeclaredTarget {
        request_id: RequestId,
        token: String,
        target: RequestId,
        declared: RequestId,
    },

    #[error("request {request_id}: token '{token}' targets request {target} but the request declares no reference")]
    UnscopedTarget {
        request_id: RequestId,
        token: String,
        target: RequestId,
    },

    #[error("request {request_id}: '{token}' references unknown request {target}")]
    UnknownRequest {
        request_id: RequestId,
        token: String,
        target: RequestId,
    },

    #[error("request {request_id}: '{token}' references request {target} which has not executed yet")]
    ForwardReference {
        request_id: RequestId,
        token: String,
        target: RequestId,
    },

    #[error("request {request_id}: '{token}' references request {target} which did not succeed")]
    FailedDependency {
        request_id: RequestId,
        token: String,
        target: RequestId,
    },

    #[error("request {request_id}: field '{path}' not found in response of request {target} (token '{token}')")]
    FieldNotFound {
        request_id: RequestId,
        token: String,
        target: RequestId,
        path: String,
    },

    #[error("request {request_id}: field '{path}' of request {target} is not a string, number or boolean and cannot be embedded in text (token '{token}')")]
    NonScalarValue {
        request_id: RequestId,
        token: String,
        target: RequestId,
        path: String,
    },
}

impl ResolutionError {
    /// The sub-request whose resolution failed
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::MalformedToken { request_id, .. }
            | Self::MissingReference { request_id, .. }
            | Self::UndeclaredTarget { request_id, .. }
            | Self::UnscopedTarget { request_id, .. }
            | Self::UnknownRequest { request_id, .. }
            | Self::ForwardReference { request_id, .. }
            | Self::FailedDependency { request_id, .. }
            | Self::FieldNotFound { request_id, .. }
            | Self::NonScalarValue { request_id, .. } => *request_id,
        }
    }

    /// The offending token text
    pub fn token(&self) -> &str {
        match self {
            Self::MalformedToken { token, .. }
            | Self::MissingReference { token, .. }
            | Self::UndeclaredTarget { token, .. }
            | Self::UnscopedTarget { token, .. }
            | Self::UnknownRequest { token, .. }
            | Self::ForwardReference { token, .. }
            | Self::FailedDependency { token, .. }
            | Self::FieldNotFound { token, .. }
            | Self::NonScalarValue { token, .. } => token,
        }
    }
}

/// No handler matches a (method, path) pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unsupported operation: no handler for {method} {path}")]
    UnsupportedOperation { method: HttpMethod, path: String },
}

/// Failure raised by a resource handler
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The operation was refused by the domain, with the handler's own status
    #[error("{message}")]
    Rejected {
        status_code: u16,
        message: String,
        body: Option<Value>,
        headers: BTreeMap<String, String>,
    },

    #[error("internal handler failure: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn rejected(status_code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status_code,
            message: message.into(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    /// Rejection whose body is returned verbatim as the sub-response body
    pub fn rejected_with_body(status_code: u16, message: impl Into<String>, body: Value) -> Self {
        Self::Rejected {
            status_code,
            message: message.into(),
            body: Some(body),
            headers: BTreeMap::new(),
        }
    }

    /// Attach a response header to a rejection; internal failures carry none
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Rejected { headers, .. } = &mut self {
            headers.insert(name.into(), value.into());
        }
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::rejected(status::BAD_REQUEST, message)
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        Self::rejected(status::NOT_FOUND, format!("{resource} with identifier {id} does not exist"))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Rejected { status_code, .. } => *status_code,
            Self::Internal(_) => status::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Any per sub-request failure
#[derive(Debug, Error)]
pub enum SubRequestError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl SubRequestError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Resolution(_) => status::BAD_REQUEST,
            Self::Dispatch(_) => status::NOT_IMPLEMENTED,
            Self::Handler(err) => err.status_code(),
        }
    }

    /// Value of the `errorType` field in error-shaped bodies
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Resolution(_) => error_types::RESOLUTION,
            Self::Dispatch(_) => error_types::DISPATCH,
            Self::Handler(_) => error_types::HANDLER,
        }
    }
}

/// The unit of work could not be opened, committed or rolled back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("failed to begin unit of work: {0}")]
    Begin(String),

    #[error("failed to commit unit of work: {0}")]
    Commit(String),

    #[error("failed to roll back unit of work: {0}")]
    Rollback(String),
}

/// Batch-level outcome other than a result list
#[derive(Debug, Error)]
pub enum BatchError {
    /// The batch violates an envelope invariant and nothing was executed
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    /// Enclosing-transaction mode stopped at the first failing sub-request
    #[error("batch aborted at request {request_id} with status {status_code}")]
    Aborted {
        request_id: RequestId,
        status_code: u16,
        body: Value,
        headers: BTreeMap<String, String>,
    },

    /// The consistency guarantee could not be honored
    #[error("transaction failure{}: {source}", .request_id.map(|id| format!(" at request {id}")).unwrap_or_default())]
    Transaction {
        request_id: Option<RequestId>,
        #[source]
        source: TransactionError,
    },

    #[error("internal orchestration error: {0}")]
    Internal(String),
}

impl BatchError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidBatch(_) => status::BAD_REQUEST,
            Self::Aborted { status_code, .. } => *status_code,
            Self::Transaction { .. } | Self::Internal(_) => status::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidBatch(_) => error_types::INVALID_BATCH,
            Self::Aborted { .. } => error_types::HANDLER,
            Self::Transaction { .. } => error_types::TRANSACTION,
            Self::Internal(_) => error_types::INTERNAL,
        }
    }
}

impl From<crate::state_machine::StateMachineError> for BatchError {
    fn from(error: crate::state_machine::StateMachineError) -> Self {
        BatchError::Internal(error.to_string())
    }
}

/// The dispatch table could not be built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("duplicate route {method} {pattern}")]
    DuplicateRoute { method: HttpMethod, pattern: String },
}
