//! PostgreSQL-backed store.
//!
//! Handlers receive the open `sqlx` transaction and run their statements
//! through it:
//!
//! ```rust,no_run
//! # use batch_orchestrator::transaction::PgStore;
//! # async fn example(tx: &mut <PgStore as batch_orchestrator::transaction::TransactionalStore>::Transaction) -> Result<(), sqlx::Error> {
//! sqlx::query("UPDATE m_loan SET status = 'approved' WHERE id = $1")
//!     .bind(42_i64)
//!     .execute(&mut **tx)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use super::TransactionalStore;
use crate::config::DatabaseConfig;
use crate::error::TransactionError;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool from the database section of the configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, TransactionError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| TransactionError::Begin("database.url is not configured".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(url)
            .await
            .map_err(|e| TransactionError::Begin(format!("failed to connect: {e}")))?;

        info!(
            max_connections = config.max_connections,
            "PostgreSQL pool ready for batch execution"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TransactionalStore for PgStore {
    type Transaction = sqlx::Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Transaction, TransactionError> {
        self.pool
            .begin()
            .await
            .map_err(|e| TransactionError::Begin(e.to_string()))
    }

    async fn commit(&self, tx: Self::Transaction) -> Result<(), TransactionError> {
        tx.commit()
            .await
            .map_err(|e| TransactionError::Commit(e.to_string()))
    }

    async fn rollback(&self, tx: Self::Transaction) -> Result<(), TransactionError> {
        tx.rollback()
            .await
            .map_err(|e| TransactionError::Rollback(e.to_string()))
    }
}
