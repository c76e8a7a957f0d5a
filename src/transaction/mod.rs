//! # Transaction Boundary
//!
//! The orchestrator does not compensate effects itself. Handlers perform their
//! work against a transaction handle supplied by a [`TransactionalStore`], and
//! the executor decides where a [`UnitOfWork`] begins and ends:
//!
//! - enclosing-transaction mode opens one unit of work around the whole batch;
//! - independent mode opens one per dispatched sub-request, committed as soon
//!   as the handler succeeds.
//!
//! Every handler receives the handle explicitly, so the engine can be tested
//! against [`InMemoryStore`] without a database.

pub mod boundary;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use boundary::UnitOfWork;
pub use memory::{InMemoryStore, MemoryTransaction, StoreStats};
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

use crate::error::TransactionError;
use async_trait::async_trait;

/// Source of atomic units of work for handlers
#[async_trait]
pub trait TransactionalStore: Send + Sync + 'static {
    /// Handle passed to every handler invocation inside the unit of work
    type Transaction: Send;

    async fn begin(&self) -> Result<Self::Transaction, TransactionError>;

    /// Make every effect recorded in `tx` durable
    async fn commit(&self, tx: Self::Transaction) -> Result<(), TransactionError>;

    /// Discard every effect recorded in `tx`
    async fn rollback(&self, tx: Self::Transaction) -> Result<(), TransactionError>;
}
