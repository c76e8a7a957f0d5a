//! Shared fixtures for integration tests

#![allow(dead_code)] // Each test binary uses a different subset

pub mod builders;
pub mod handlers;
pub mod strategies;

use batch_orchestrator::config::ExecutionConfig;
use batch_orchestrator::transaction::InMemoryStore;
use batch_orchestrator::{BatchApi, BatchExecutor, CommandDispatchTable, HttpMethod};
use handlers::*;
use std::sync::Arc;

/// Dispatch table of the fixture resource API
pub fn build_dispatch_table() -> CommandDispatchTable<InMemoryStore> {
    CommandDispatchTable::builder()
        .route(HttpMethod::Post, "clients", CreateClient)
        .and_then(|t| t.route(HttpMethod::Get, "clients/{clientId}", GetClient))
        .and_then(|t| t.route(HttpMethod::Put, "clients/{clientId}", UpdateClient))
        .and_then(|t| t.route(HttpMethod::Post, "clients/{clientId}?command=activate", ActivateClient))
        .and_then(|t| t.route(HttpMethod::Post, "loans", ApplyLoan))
        .and_then(|t| t.route(HttpMethod::Get, "loans/{loanId}", GetLoan))
        .and_then(|t| t.route(HttpMethod::Post, "loans/{loanId}?command=approve", ApproveLoan))
        .and_then(|t| t.route(HttpMethod::Post, "loans/{loanId}?command=disburse", DisburseLoan))
        .and_then(|t| t.route(HttpMethod::Post, "loans/{loanId}/charges", CreateCharge))
        .and_then(|t| t.route(HttpMethod::Get, "loans/{loanId}/charges", CollectCharges))
        .and_then(|t| {
            t.route(
                HttpMethod::Post,
                "loans/{loanId}/transactions?command=repayment",
                RepayLoan,
            )
        })
        .and_then(|t| {
            t.route(
                HttpMethod::Get,
                "loans/{loanId}/transactions/{transactionId}",
                GetTransactionById,
            )
        })
        .and_then(|t| t.route(HttpMethod::Post, "savingsaccounts", ApplySavings))
        .and_then(|t| t.route(HttpMethod::Post, "explode", ExplodingHandler))
        .expect("fixture routes are valid")
        .build()
}

pub fn executor(store: &InMemoryStore) -> BatchExecutor<InMemoryStore> {
    BatchExecutor::new(Arc::new(store.clone()), Arc::new(build_dispatch_table()))
}

pub fn executor_with(store: &InMemoryStore, config: &ExecutionConfig) -> BatchExecutor<InMemoryStore> {
    BatchExecutor::from_config(Arc::new(store.clone()), Arc::new(build_dispatch_table()), config)
}

pub fn api(store: &InMemoryStore) -> BatchApi<InMemoryStore> {
    BatchApi::from_config(
        Arc::new(store.clone()),
        Arc::new(build_dispatch_table()),
        &ExecutionConfig::default(),
    )
}

/// Seed a committed client and return its id
pub fn seed_client(store: &InMemoryStore, external_id: &str) -> i64 {
    store.insert_committed(
        CLIENTS,
        serde_json::json!({
            "officeId": 1,
            "firstname": "Seeded",
            "lastname": "Client",
            "externalId": external_id,
            "active": false,
        }),
    )
}
