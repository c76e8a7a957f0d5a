//! A small client/loan/charge/savings resource API over `InMemoryStore`, enough to
//! exercise batches the way a real portfolio API would be driven.

use async_trait::async_trait;
use batch_orchestrator::transaction::{InMemoryStore, MemoryTransaction};
use batch_orchestrator::{CommandRequest, CommandStrategy, HandlerError, HandlerOutcome};
use serde_json::{json, Value};

pub const CLIENTS: &str = "clients";
pub const LOANS: &str = "loans";
pub const LOAN_CHARGES: &str = "loan_charges";
pub const LOAN_TRANSACTIONS: &str = "loan_transactions";
pub const SAVINGS_ACCOUNTS: &str = "savings_accounts";

fn with_id(id: i64, mut record: Value) -> Value {
    if let Value::Object(fields) = &mut record {
        fields.insert("id".to_string(), json!(id));
    }
    record
}

fn load(tx: &MemoryTransaction, collection: &str, resource: &str, id: i64) -> Result<Value, HandlerError> {
    tx.get(collection, id)
        .ok_or_else(|| HandlerError::not_found(resource, id))
}

/// Amounts arrive as numbers or as formatted strings such as "10,000.00"
fn required_amount(request: &CommandRequest, name: &str) -> Result<f64, HandlerError> {
    let amount = match request.body_field(name) {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.replace(',', "").trim().parse().ok(),
        _ => None,
    };
    match amount {
        Some(amount) if amount > 0.0 => Ok(amount),
        Some(_) => Err(HandlerError::validation(format!("the parameter '{name}' must be greater than 0"))),
        None => Err(HandlerError::validation(format!("the parameter '{name}' is mandatory"))),
    }
}

fn transition_loan(
    tx: &mut MemoryTransaction,
    loan_id: i64,
    expected: &str,
    next: &str,
) -> Result<HandlerOutcome, HandlerError> {
    let mut loan = load(tx, LOANS, "loan", loan_id)?;
    let status = loan["status"].as_str().unwrap_or_default().to_string();
    if status != expected {
        return Err(HandlerError::rejected(
            403,
            format!("loan {loan_id} is {status}, expected {expected}"),
        ));
    }
    loan["status"] = json!(next);
    tx.update(LOANS, loan_id, loan);
    Ok(HandlerOutcome::ok(json!({
        "loanId": loan_id,
        "resourceId": loan_id,
        "changes": {"status": next},
    })))
}

/// POST clients
pub struct CreateClient;

#[async_trait]
impl CommandStrategy<InMemoryStore> for CreateClient {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let office_id = request.required_i64("officeId")?;
        let firstname = request.required_str("firstname")?;
        let lastname = request.required_str("lastname")?;
        let external_id = request.body_field("externalId").cloned().unwrap_or(Value::Null);

        if !external_id.is_null() && !tx.find_by(CLIENTS, "externalId", &external_id).is_empty() {
            return Err(HandlerError::rejected(
                403,
                format!("client with externalId {external_id} already exists"),
            ));
        }

        let active = request.body_field("active").and_then(Value::as_bool).unwrap_or(false);
        let client_id = tx.insert(
            CLIENTS,
            json!({
                "officeId": office_id,
                "firstname": firstname,
                "lastname": lastname,
                "externalId": external_id,
                "active": active,
            }),
        );

        Ok(HandlerOutcome::created(json!({
            "officeId": office_id,
            "clientId": client_id,
            "resourceId": client_id,
        })))
    }
}

/// PUT clients/{clientId}
pub struct UpdateClient;

#[async_trait]
impl CommandStrategy<InMemoryStore> for UpdateClient {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let client_id = request.path_id("clientId")?;
        let mut client = load(tx, CLIENTS, "client", client_id)?;

        let mut changes = serde_json::Map::new();
        for field in ["firstname", "lastname"] {
            if let Some(value) = request.body_field(field) {
                client[field] = value.clone();
                changes.insert(field.to_string(), value.clone());
            }
        }
        tx.update(CLIENTS, client_id, client);

        Ok(HandlerOutcome::ok(json!({
            "clientId": client_id,
            "resourceId": client_id,
            "changes": changes,
        })))
    }
}

/// POST clients/{clientId}?command=activate
pub struct ActivateClient;

#[async_trait]
impl CommandStrategy<InMemoryStore> for ActivateClient {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let client_id = request.path_id("clientId")?;
        let mut client = load(tx, CLIENTS, "client", client_id)?;
        if client["active"] == json!(true) {
            return Err(HandlerError::rejected(403, format!("client {client_id} is already active")));
        }
        client["active"] = json!(true);
        tx.update(CLIENTS, client_id, client);

        Ok(HandlerOutcome::ok(json!({
            "clientId": client_id,
            "resourceId": client_id,
        })))
    }
}

/// GET clients/{clientId}
pub struct GetClient;

#[async_trait]
impl CommandStrategy<InMemoryStore> for GetClient {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let client_id = request.path_id("clientId")?;
        let client = load(tx, CLIENTS, "client", client_id)?;
        Ok(HandlerOutcome::ok(with_id(client_id, client)))
    }
}

/// POST loans
pub struct ApplyLoan;

#[async_trait]
impl CommandStrategy<InMemoryStore> for ApplyLoan {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let client_id = request.required_i64("clientId")?;
        let product_id = request.required_i64("productId")?;
        let principal = required_amount(request, "principal")?;
        load(tx, CLIENTS, "client", client_id)?;

        let loan_id = tx.insert(
            LOANS,
            json!({
                "clientId": client_id,
                "productId": product_id,
                "principal": principal,
                "status": "submitted",
            }),
        );

        Ok(HandlerOutcome::created(json!({
            "clientId": client_id,
            "loanId": loan_id,
            "resourceId": loan_id,
        })))
    }
}

/// POST loans/{loanId}?command=approve
pub struct ApproveLoan;

#[async_trait]
impl CommandStrategy<InMemoryStore> for ApproveLoan {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        transition_loan(tx, request.path_id("loanId")?, "submitted", "approved")
    }
}

/// POST loans/{loanId}?command=disburse
pub struct DisburseLoan;

#[async_trait]
impl CommandStrategy<InMemoryStore> for DisburseLoan {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        transition_loan(tx, request.path_id("loanId")?, "approved", "active")
    }
}

/// GET loans/{loanId}
pub struct GetLoan;

#[async_trait]
impl CommandStrategy<InMemoryStore> for GetLoan {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let loan_id = request.path_id("loanId")?;
        let mut loan = with_id(loan_id, load(tx, LOANS, "loan", loan_id)?);

        if request.query_param("associations") == Some("charges") {
            let charges: Vec<Value> = tx
                .find_by(LOAN_CHARGES, "loanId", &json!(loan_id))
                .into_iter()
                .map(|(id, charge)| with_id(id, charge))
                .collect();
            loan["charges"] = Value::Array(charges);
        }
        Ok(HandlerOutcome::ok(loan))
    }
}

/// POST loans/{loanId}/charges
pub struct CreateCharge;

#[async_trait]
impl CommandStrategy<InMemoryStore> for CreateCharge {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let loan_id = request.path_id("loanId")?;
        let charge_id = request.required_i64("chargeId")?;
        let amount = required_amount(request, "amount")?;
        load(tx, LOANS, "loan", loan_id)?;

        let resource_id = tx.insert(
            LOAN_CHARGES,
            json!({"loanId": loan_id, "chargeId": charge_id, "amount": amount}),
        );

        Ok(HandlerOutcome::created(json!({
            "loanId": loan_id,
            "resourceId": resource_id,
        })))
    }
}

/// GET loans/{loanId}/charges, answering with a JSON array
pub struct CollectCharges;

#[async_trait]
impl CommandStrategy<InMemoryStore> for CollectCharges {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let loan_id = request.path_id("loanId")?;
        load(tx, LOANS, "loan", loan_id)?;

        let charges = tx
            .find_by(LOAN_CHARGES, "loanId", &json!(loan_id))
            .into_iter()
            .map(|(id, charge)| with_id(id, charge))
            .collect();
        Ok(HandlerOutcome::ok(Value::Array(charges)))
    }
}

/// POST loans/{loanId}/transactions?command=repayment
pub struct RepayLoan;

#[async_trait]
impl CommandStrategy<InMemoryStore> for RepayLoan {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let loan_id = request.path_id("loanId")?;
        let amount = required_amount(request, "transactionAmount")?;
        let loan = load(tx, LOANS, "loan", loan_id)?;
        if loan["status"] != json!("active") {
            return Err(HandlerError::rejected(
                403,
                format!("loan {loan_id} is not active and cannot be repaid"),
            ));
        }

        let transaction_id = tx.insert(
            LOAN_TRANSACTIONS,
            json!({"loanId": loan_id, "type": "repayment", "amount": amount}),
        );

        Ok(HandlerOutcome::ok(json!({
            "loanId": loan_id,
            "resourceId": transaction_id,
        })))
    }
}

/// GET loans/{loanId}/transactions/{transactionId}
pub struct GetTransactionById;

#[async_trait]
impl CommandStrategy<InMemoryStore> for GetTransactionById {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let loan_id = request.path_id("loanId")?;
        let transaction_id = request.path_id("transactionId")?;
        let transaction = load(tx, LOAN_TRANSACTIONS, "loan transaction", transaction_id)?;
        if transaction["loanId"] != json!(loan_id) {
            return Err(HandlerError::not_found("loan transaction", transaction_id));
        }
        Ok(HandlerOutcome::ok(with_id(transaction_id, transaction)))
    }
}

/// POST savingsaccounts
pub struct ApplySavings;

#[async_trait]
impl CommandStrategy<InMemoryStore> for ApplySavings {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        let client_id = request.required_i64("clientId")?;
        let product_id = request.required_i64("productId")?;
        let submitted_on = request.required_str("submittedOnDate")?.to_string();
        load(tx, CLIENTS, "client", client_id)?;

        let savings_id = tx.insert(
            SAVINGS_ACCOUNTS,
            json!({
                "clientId": client_id,
                "productId": product_id,
                "submittedOnDate": submitted_on,
                "status": "submitted",
            }),
        );

        Ok(HandlerOutcome::created(json!({
            "clientId": client_id,
            "savingsId": savings_id,
            "resourceId": savings_id,
        }))
        .with_header("Location", format!("savingsaccounts/{savings_id}")))
    }
}

/// Always fails with an internal error after writing, to prove rollback
pub struct ExplodingHandler;

#[async_trait]
impl CommandStrategy<InMemoryStore> for ExplodingHandler {
    async fn execute(
        &self,
        _request: &CommandRequest,
        tx: &mut MemoryTransaction,
    ) -> Result<HandlerOutcome, HandlerError> {
        tx.insert(CLIENTS, json!({"firstname": "ghost"}));
        Err(anyhow::anyhow!("storage exploded").into())
    }
}
