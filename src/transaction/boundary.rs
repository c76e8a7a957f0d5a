use super::TransactionalStore;
use crate::error::TransactionError;
use tracing::{debug, warn};

/// A single open unit of work.
///
/// Closing it consumes it, so a unit of work is committed or rolled back at
/// most once. One that is dropped while still open is never applied: its
/// handle is released without commit.
pub struct UnitOfWork<'s, S: TransactionalStore> {
    store: &'s S,
    tx: Option<S::Transaction>,
    label: String,
}

impl<'s, S: TransactionalStore> UnitOfWork<'s, S> {
    pub async fn begin(store: &'s S, label: impl Into<String>) -> Result<Self, TransactionError> {
        let label = label.into();
        let tx = store.begin().await?;
        debug!(unit_of_work = %label, "Unit of work opened");
        Ok(Self {
            store,
            tx: Some(tx),
            label,
        })
    }

    /// Handle to pass to handlers
    pub fn transaction(&mut self) -> Result<&mut S::Transaction, TransactionError> {
        self.tx
            .as_mut()
            .ok_or_else(|| TransactionError::Begin(format!("unit of work '{}' is closed", self.label)))
    }

    pub async fn commit(mut self) -> Result<(), TransactionError> {
        let tx = self.take()?;
        self.store.commit(tx).await?;
        debug!(unit_of_work = %self.label, "Unit of work committed");
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), TransactionError> {
        let tx = self.take()?;
        self.store.rollback(tx).await?;
        debug!(unit_of_work = %self.label, "Unit of work rolled back");
        Ok(())
    }

    fn take(&mut self) -> Result<S::Transaction, TransactionError> {
        self.tx
            .take()
            .ok_or_else(|| TransactionError::Commit(format!("unit of work '{}' is already closed", self.label)))
    }
}

impl<S: TransactionalStore> Drop for UnitOfWork<'_, S> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(
                unit_of_work = %self.label,
                "Unit of work dropped while open; its effects are discarded"
            );
        }
    }
}
