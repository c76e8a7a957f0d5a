//! # Batch API
//!
//! The external envelope: a JSON array of sub-requests in, a status code and
//! JSON text out. The `enclosingTransaction` query parameter selects the
//! execution mode.

use crate::config::ExecutionConfig;
use crate::constants::{error_types, status, ENCLOSING_TRANSACTION_PARAM, JSON_CONTENT_TYPE};
use crate::error::BatchError;
use crate::models::{ExecutionMode, SubRequest};
use crate::orchestration::BatchExecutor;
use crate::registry::CommandDispatchTable;
use crate::transaction::TransactionalStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// Status code and serialized JSON body of a batch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
}

impl ApiResponse {
    fn json(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    fn error(status_code: u16, error_type: &str, message: &str) -> Self {
        Self::json(
            status_code,
            &json!({
                "errorType": error_type,
                "message": message,
            }),
        )
    }

    pub fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[derive(Debug)]
pub struct BatchApi<S: TransactionalStore> {
    executor: BatchExecutor<S>,
    enclosing_by_default: bool,
}

impl<S: TransactionalStore> BatchApi<S> {
    pub fn new(executor: BatchExecutor<S>) -> Self {
        Self {
            executor,
            enclosing_by_default: false,
        }
    }

    pub fn from_config(
        store: Arc<S>,
        dispatch_table: Arc<CommandDispatchTable<S>>,
        config: &ExecutionConfig,
    ) -> Self {
        Self {
            executor: BatchExecutor::from_config(store, dispatch_table, config),
            enclosing_by_default: config.enclosing_transaction_by_default,
        }
    }

    pub fn executor(&self) -> &BatchExecutor<S> {
        &self.executor
    }

    /// Handle one batch call. `query` is the raw query string without `?`.
    pub async fn handle(&self, query: Option<&str>, body: &str) -> ApiResponse {
        let mode = match self.execution_mode(query) {
            Ok(mode) => mode,
            Err(message) => {
                return ApiResponse::error(status::BAD_REQUEST, error_types::INVALID_BATCH, &message)
            }
        };

        let requests: Vec<SubRequest> = match serde_json::from_str(body) {
            Ok(requests) => requests,
            Err(e) => {
                debug!(error = %e, "Rejected malformed batch body");
                return ApiResponse::error(
                    status::BAD_REQUEST,
                    error_types::INVALID_BATCH,
                    &format!("batch body must be a JSON array of sub-requests: {e}"),
                );
            }
        };

        match self.executor.execute_batch(&requests, mode).await {
            Ok(responses) => match serde_json::to_value(&responses) {
                Ok(body) => ApiResponse::json(status::OK, &body),
                Err(e) => {
                    error!(error = %e, "Failed to serialize batch responses");
                    ApiResponse::error(
                        status::INTERNAL_SERVER_ERROR,
                        error_types::INTERNAL,
                        &e.to_string(),
                    )
                }
            },
            Err(BatchError::Aborted {
                request_id,
                status_code,
                body,
                headers,
            }) => ApiResponse::json(
                status_code,
                &json!({
                    "requestId": request_id,
                    "statusCode": status_code,
                    "body": body,
                    "headers": headers,
                }),
            ),
            Err(e) => ApiResponse::error(e.status_code(), e.error_type(), &e.to_string()),
        }
    }

    fn execution_mode(&self, query: Option<&str>) -> Result<ExecutionMode, String> {
        let flag = query.and_then(|query| {
            url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
                .find(|(name, _)| name == ENCLOSING_TRANSACTION_PARAM)
                .map(|(_, value)| value.into_owned())
        });

        let enclosing = match flag.as_deref().map(str::trim) {
            None => self.enclosing_by_default,
            Some(value) if value.eq_ignore_ascii_case("true") => true,
            Some(value) if value.eq_ignore_ascii_case("false") => false,
            Some(value) => {
                return Err(format!(
                    "query parameter '{ENCLOSING_TRANSACTION_PARAM}' must be true or false, got '{value}'"
                ))
            }
        };
        Ok(ExecutionMode::from_enclosing_transaction(enclosing))
    }
}
