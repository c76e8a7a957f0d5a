#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batch Orchestrator
//!
//! Executes an ordered batch of REST-style sub-requests as one call.
//!
//! ## Overview
//!
//! A batch is a list of sub-requests (`requestId`, `method`, `relativeUrl`,
//! optional `body`, `reference` and `headers`). Later sub-requests can use
//! values from earlier responses through reference tokens:
//!
//! - `$.clientId` reads `clientId` from the response of the declared `reference`
//! - `${1}.charges[0].amount` names the target request explicitly
//!
//! Each sub-request is routed through an immutable command dispatch table to a
//! handler, which performs its work inside a unit of work supplied by the
//! executor. In independent mode every sub-request commits or rolls back on its
//! own; in enclosing-transaction mode the whole batch is all or nothing.
//!
//! ## Module Organization
//!
//! - [`api`] - JSON envelope and execution mode selection
//! - [`models`] - Sub-requests, sub-responses and batch validation
//! - [`resolver`] - Reference token parsing and substitution
//! - [`registry`] - Path patterns, handler trait and dispatch table
//! - [`orchestration`] - Batch executor and response assembler
//! - [`transaction`] - Unit-of-work boundary and store implementations
//! - [`state_machine`] - Sub-request and batch lifecycles
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batch_orchestrator::config::BatchConfig;
//! use batch_orchestrator::registry::CommandDispatchTable;
//! use batch_orchestrator::transaction::InMemoryStore;
//! use batch_orchestrator::BatchApi;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchConfig::load()?;
//! batch_orchestrator::logging::init_structured_logging(&config.logging);
//!
//! let table = CommandDispatchTable::<InMemoryStore>::builder()
//!     // .route(HttpMethod::Post, "clients", CreateClient)?
//!     .build();
//! let api = BatchApi::from_config(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(table),
//!     &config.execution,
//! );
//!
//! let response = api
//!     .handle(Some("enclosingTransaction=true"), r#"[]"#)
//!     .await;
//! assert_eq!(response.status_code, 200);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib                       # Unit tests
//! cargo test                             # All tests
//! cargo test -- --ignored                # PostgreSQL tests, needs DATABASE_URL
//! cargo bench --features benchmarks      # Resolver benchmarks
//! ```

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod registry;
pub mod resolver;
pub mod state_machine;
pub mod transaction;

pub use api::{ApiResponse, BatchApi};
pub use config::BatchConfig;
pub use error::{
    BatchError, DispatchError, HandlerError, RegistryError, ResolutionError, SubRequestError,
    TransactionError,
};
pub use models::{ExecutionMode, HttpMethod, RequestId, SubRequest, SubResponse};
pub use orchestration::{BatchExecutor, ResponseAssembler};
pub use registry::{CommandDispatchTable, CommandRequest, CommandStrategy, HandlerOutcome};
pub use resolver::ReferenceResolver;
pub use transaction::{InMemoryStore, TransactionalStore, UnitOfWork};
