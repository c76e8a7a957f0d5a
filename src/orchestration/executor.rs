//! # Batch Executor
//!
//! Runs the sub-requests of a batch strictly in order, resolving reference
//! tokens against the responses produced so far, dispatching each to its
//! handler and recording one response per executed sub-request.
//!
//! ## Execution modes
//!
//! - **Independent**: every dispatched sub-request gets its own unit of work,
//!   committed on success and rolled back on failure. Failures become
//!   error-shaped responses and execution continues.
//! - **Enclosing transaction**: one unit of work spans the batch. The first
//!   failure rolls it back and ends the batch with [`BatchError::Aborted`].
//!
//! A [`TransactionError`] ends the batch in both modes.

use crate::config::ExecutionConfig;
use crate::error::{BatchError, HandlerError, SubRequestError, TransactionError};
use crate::logging::{log_batch_finished, log_batch_started, log_sub_request_outcome};
use crate::models::{validate_batch, ExecutionMode, RequestId, SubRequest, SubResponse};
use crate::orchestration::assembler::ResponseAssembler;
use crate::registry::{CommandDispatchTable, CommandRequest, CommandStrategy};
use crate::resolver::{ReferenceResolver, ResponseLedger};
use crate::state_machine::{
    BatchEvent, BatchStateMachine, SubRequestEvent, SubRequestStateMachine,
};
use crate::transaction::{TransactionalStore, UnitOfWork};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// A sub-request ready to hand to its handler
struct Prepared<S: TransactionalStore> {
    strategy: Arc<dyn CommandStrategy<S>>,
    command: CommandRequest,
}

/// Executes batches against a shared store and dispatch table.
///
/// Holds no per-batch state, so one executor serves any number of concurrent
/// batches.
pub struct BatchExecutor<S: TransactionalStore> {
    store: Arc<S>,
    dispatch_table: Arc<CommandDispatchTable<S>>,
    resolver: ReferenceResolver,
    max_batch_size: usize,
}

impl<S: TransactionalStore> BatchExecutor<S> {
    pub fn new(store: Arc<S>, dispatch_table: Arc<CommandDispatchTable<S>>) -> Self {
        Self::from_config(store, dispatch_table, &ExecutionConfig::default())
    }

    pub fn from_config(
        store: Arc<S>,
        dispatch_table: Arc<CommandDispatchTable<S>>,
        config: &ExecutionConfig,
    ) -> Self {
        Self {
            store,
            dispatch_table,
            resolver: ReferenceResolver::new(config.strict_references),
            max_batch_size: config.max_batch_size,
        }
    }

    pub fn with_resolver(mut self, resolver: ReferenceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// 0 disables the limit
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn dispatch_table(&self) -> &CommandDispatchTable<S> {
        &self.dispatch_table
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Execute `requests` in order under `mode`.
    ///
    /// Returns one response per sub-request in input order, or the batch-level
    /// failure. An empty batch returns immediately without touching the store.
    pub async fn execute_batch(
        &self,
        requests: &[SubRequest],
        mode: ExecutionMode,
    ) -> Result<Vec<SubResponse>, BatchError> {
        validate_batch(requests, self.max_batch_size)?;
        if requests.is_empty() {
            debug!(mode = %mode, "Empty batch, nothing to execute");
            return Ok(Vec::new());
        }

        let batch_id = Uuid::new_v4();
        let span = info_span!("batch", batch_id = %batch_id, mode = %mode, size = requests.len());

        async move {
            let started = Instant::now();
            log_batch_started(batch_id, mode, requests.len());

            let mut batch = BatchStateMachine::new(batch_id);
            let result = match mode {
                ExecutionMode::Independent => self.run_independent(requests, &mut batch).await,
                ExecutionMode::EnclosingTransaction => {
                    self.run_enclosing(requests, &mut batch).await
                }
            };

            if let Err(error) = &result {
                if !batch.current_state().is_terminal() {
                    let failed_at = match error {
                        BatchError::Aborted { request_id, .. } => Some(*request_id),
                        BatchError::Transaction { request_id, .. } => *request_id,
                        _ => None,
                    };
                    if let Err(transition_error) = batch.transition(BatchEvent::Abort(failed_at)) {
                        warn!(error = %transition_error, "Could not mark batch as aborted");
                    }
                }
            }

            log_batch_finished(
                batch_id,
                mode,
                &batch.current_state().to_string(),
                result.as_ref().map(Vec::len).unwrap_or_default(),
                started.elapsed(),
            );
            result
        }
        .instrument(span)
        .await
    }

    async fn run_independent(
        &self,
        requests: &[SubRequest],
        batch: &mut BatchStateMachine,
    ) -> Result<Vec<SubResponse>, BatchError> {
        let mut ledger = ResponseLedger::for_batch(requests);
        let mut responses = Vec::with_capacity(requests.len());

        for request in requests {
            let mut machine = SubRequestStateMachine::new(request.request_id);
            machine.transition(SubRequestEvent::Resolve)?;

            let result = match self.prepare(request, &ledger) {
                Ok(prepared) => {
                    machine.transition(SubRequestEvent::Dispatch)?;
                    self.invoke_in_own_unit(request.request_id, prepared).await?
                }
                Err(error) => Err(error),
            };

            let (response, _) = Self::record(request, result, &mut ledger, &mut machine)?;
            responses.push(response);
        }

        batch.transition(BatchEvent::Commit)?;
        Ok(responses)
    }

    async fn run_enclosing(
        &self,
        requests: &[SubRequest],
        batch: &mut BatchStateMachine,
    ) -> Result<Vec<SubResponse>, BatchError> {
        let mut unit = UnitOfWork::begin(self.store.as_ref(), format!("batch {}", batch.batch_id()))
            .await
            .map_err(|source| transaction_failure(None, source))?;

        let mut ledger = ResponseLedger::for_batch(requests);
        let mut responses = Vec::with_capacity(requests.len());

        for request in requests {
            let mut machine = SubRequestStateMachine::new(request.request_id);
            machine.transition(SubRequestEvent::Resolve)?;

            let result = match self.prepare(request, &ledger) {
                Ok(prepared) => {
                    machine.transition(SubRequestEvent::Dispatch)?;
                    let tx = unit
                        .transaction()
                        .map_err(|source| transaction_failure(Some(request.request_id), source))?;
                    Self::invoke(prepared, tx).await
                }
                Err(error) => Err(error),
            };

            let (response, succeeded) = Self::record(request, result, &mut ledger, &mut machine)?;
            if !succeeded {
                unit.rollback()
                    .await
                    .map_err(|source| transaction_failure(Some(request.request_id), source))?;
                batch.transition(BatchEvent::Abort(Some(request.request_id)))?;
                return Err(BatchError::Aborted {
                    request_id: response.request_id,
                    status_code: response.status_code,
                    body: response.body,
                    headers: response.headers,
                });
            }
            responses.push(response);
        }

        unit.commit()
            .await
            .map_err(|source| transaction_failure(None, source))?;
        batch.transition(BatchEvent::Commit)?;
        Ok(responses)
    }

    /// Resolve tokens and select the handler
    fn prepare(
        &self,
        request: &SubRequest,
        ledger: &ResponseLedger,
    ) -> Result<Prepared<S>, SubRequestError> {
        self.resolver.check_declared_reference(request, ledger)?;
        let relative_url = self.resolver.resolve_url(request, ledger)?;
        let body = self.resolver.resolve_body(request, ledger)?;
        let route = self.dispatch_table.dispatch(request.method, &relative_url)?;

        debug!(
            request_id = request.request_id,
            pattern = %route.pattern,
            relative_url = %relative_url,
            "Sub-request dispatched"
        );

        Ok(Prepared {
            strategy: route.strategy,
            command: CommandRequest {
                request_id: request.request_id,
                method: request.method,
                relative_url,
                path: route.path,
                path_params: route.path_params,
                query: route.query,
                body,
                headers: request.headers.clone(),
            },
        })
    }

    /// Run one handler in a unit of work of its own. The outer error is fatal
    /// to the batch; the inner result is the sub-request's outcome.
    async fn invoke_in_own_unit(
        &self,
        request_id: RequestId,
        prepared: Prepared<S>,
    ) -> Result<Result<SubResponse, SubRequestError>, BatchError> {
        let mut unit = UnitOfWork::begin(self.store.as_ref(), format!("request {request_id}"))
            .await
            .map_err(|source| transaction_failure(Some(request_id), source))?;

        let tx = unit
            .transaction()
            .map_err(|source| transaction_failure(Some(request_id), source))?;
        let result = Self::invoke(prepared, tx).await;

        let closed = if result.is_ok() {
            unit.commit().await
        } else {
            unit.rollback().await
        };
        closed.map_err(|source| transaction_failure(Some(request_id), source))?;

        Ok(result)
    }

    /// Invoke the handler; a non-2xx outcome counts as a failure
    async fn invoke(
        prepared: Prepared<S>,
        tx: &mut S::Transaction,
    ) -> Result<SubResponse, SubRequestError> {
        let Prepared { strategy, command } = prepared;
        let outcome = strategy.execute(&command, tx).await?;

        if !outcome.is_success() {
            return Err(HandlerError::Rejected {
                status_code: outcome.status_code,
                message: format!(
                    "{} {} returned status {}",
                    command.method, command.relative_url, outcome.status_code
                ),
                body: outcome.body,
                headers: outcome.headers,
            }
            .into());
        }

        Ok(ResponseAssembler::from_outcome(command.request_id, outcome))
    }

    /// Turn the outcome into a response and make it visible to later
    /// sub-requests when it succeeded
    fn record(
        request: &SubRequest,
        result: Result<SubResponse, SubRequestError>,
        ledger: &mut ResponseLedger,
        machine: &mut SubRequestStateMachine,
    ) -> Result<(SubResponse, bool), BatchError> {
        let (response, succeeded) = match result {
            Ok(response) => {
                log_sub_request_outcome(
                    request.request_id,
                    request.method.as_str(),
                    &request.relative_url,
                    response.status_code,
                    None,
                    None,
                );
                ledger.record_success(response.clone());
                (response, true)
            }
            Err(error) => {
                let response = ResponseAssembler::from_error(request.request_id, &error);
                log_sub_request_outcome(
                    request.request_id,
                    request.method.as_str(),
                    &request.relative_url,
                    response.status_code,
                    Some(error.error_type()),
                    Some(&error.to_string()),
                );
                ledger.record_failure(request.request_id);
                (response, false)
            }
        };

        machine.transition(SubRequestEvent::Record(response.status_code))?;
        Ok((response, succeeded))
    }
}

fn transaction_failure(request_id: Option<RequestId>, source: TransactionError) -> BatchError {
    BatchError::Transaction { request_id, source }
}

impl<S: TransactionalStore> Clone for BatchExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatch_table: Arc::clone(&self.dispatch_table),
            resolver: self.resolver,
            max_batch_size: self.max_batch_size,
        }
    }
}

impl<S: TransactionalStore> fmt::Debug for BatchExecutor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchExecutor")
            .field("dispatch_table", &self.dispatch_table)
            .field("resolver", &self.resolver)
            .field("max_batch_size", &self.max_batch_size)
            .finish_non_exhaustive()
    }
}
