//! In-memory transactional store.
//!
//! Each [`MemoryTransaction`] keeps a private write log layered over the
//! committed tables: reads inside the transaction see its own writes, other
//! transactions do not. Commit applies the log under a single write lock,
//! rollback drops it. Identifiers come from a shared sequence and are not
//! reused after a rollback, the way database sequences behave.

use super::TransactionalStore;
use crate::error::TransactionError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

type Table = BTreeMap<i64, Value>;

#[derive(Debug, Default)]
struct MemoryState {
    tables: RwLock<HashMap<String, Table>>,
    next_id: AtomicI64,
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
    fail_next_begin: AtomicBool,
    fail_next_commit: AtomicBool,
    fail_next_rollback: AtomicBool,
}

impl MemoryState {
    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Counters of unit-of-work activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

/// Shared handle to an in-memory collection of JSON records
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record outside any unit of work
    pub fn insert_committed(&self, collection: &str, record: Value) -> i64 {
        let id = self.state.allocate_id();
        self.state
            .tables
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id, record);
        id
    }

    pub fn get(&self, collection: &str, id: i64) -> Option<Value> {
        self.state.tables.read().get(collection)?.get(&id).cloned()
    }

    /// Committed contents of a collection
    pub fn snapshot(&self, collection: &str) -> BTreeMap<i64, Value> {
        self.state
            .tables
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.state.tables.read().get(collection).map_or(0, BTreeMap::len)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            begun: self.state.begun.load(Ordering::SeqCst),
            committed: self.state.committed.load(Ordering::SeqCst),
            rolled_back: self.state.rolled_back.load(Ordering::SeqCst),
        }
    }

    /// Make the next `begin` fail
    pub fn fail_next_begin(&self) {
        self.state.fail_next_begin.store(true, Ordering::SeqCst);
    }

    /// Make the next `commit` fail; the transaction's writes are discarded
    pub fn fail_next_commit(&self) {
        self.state.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_rollback(&self) {
        self.state.fail_next_rollback.store(true, Ordering::SeqCst);
    }
}

/// Write log of one open unit of work
#[derive(Debug)]
pub struct MemoryTransaction {
    state: Arc<MemoryState>,
    /// `None` marks a deletion
    writes: BTreeMap<(String, i64), Option<Value>>,
}

impl MemoryTransaction {
    /// Insert a record and return its new identifier
    pub fn insert(&mut self, collection: &str, record: Value) -> i64 {
        let id = self.state.allocate_id();
        self.writes.insert((collection.to_string(), id), Some(record));
        id
    }

    pub fn get(&self, collection: &str, id: i64) -> Option<Value> {
        match self.writes.get(&(collection.to_string(), id)) {
            Some(staged) => staged.clone(),
            None => self.state.tables.read().get(collection)?.get(&id).cloned(),
        }
    }

    /// Replace an existing record, returns false when it does not exist
    pub fn update(&mut self, collection: &str, id: i64, record: Value) -> bool {
        if self.get(collection, id).is_none() {
            return false;
        }
        self.writes.insert((collection.to_string(), id), Some(record));
        true
    }

    pub fn delete(&mut self, collection: &str, id: i64) -> bool {
        if self.get(collection, id).is_none() {
            return false;
        }
        self.writes.insert((collection.to_string(), id), None);
        true
    }

    /// Every record of a collection as seen from inside this transaction
    pub fn list(&self, collection: &str) -> Vec<(i64, Value)> {
        let mut merged = self
            .state
            .tables
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default();

        for ((staged_collection, id), staged) in &self.writes {
            if staged_collection != collection {
                continue;
            }
            match staged {
                Some(record) => {
                    merged.insert(*id, record.clone());
                }
                None => {
                    merged.remove(id);
                }
            }
        }

        merged.into_iter().collect()
    }

    /// Records whose top-level `field` equals `expected`
    pub fn find_by(&self, collection: &str, field: &str, expected: &Value) -> Vec<(i64, Value)> {
        self.list(collection)
            .into_iter()
            .filter(|(_, record)| record.get(field) == Some(expected))
            .collect()
    }

    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction, TransactionError> {
        if self.state.fail_next_begin.swap(false, Ordering::SeqCst) {
            return Err(TransactionError::Begin("injected begin failure".to_string()));
        }
        self.state.begun.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTransaction {
            state: Arc::clone(&self.state),
            writes: BTreeMap::new(),
        })
    }

    async fn commit(&self, tx: Self::Transaction) -> Result<(), TransactionError> {
        if self.state.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(TransactionError::Commit("injected commit failure".to_string()));
        }

        let mut tables = self.state.tables.write();
        for ((collection, id), staged) in tx.writes {
            let table = tables.entry(collection).or_default();
            match staged {
                Some(record) => {
                    table.insert(id, record);
                }
                None => {
                    table.remove(&id);
                }
            }
        }
        self.state.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self, tx: Self::Transaction) -> Result<(), TransactionError> {
        drop(tx);
        if self.state.fail_next_rollback.swap(false, Ordering::SeqCst) {
            return Err(TransactionError::Rollback("injected rollback failure".to_string()));
        }
        self.state.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
