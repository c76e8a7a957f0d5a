//! Sub-request builders mirroring the shapes a portfolio client sends.
//! Bodies are JSON text, as batch clients usually encode them.

use batch_orchestrator::{HttpMethod, RequestId, SubRequest};

pub fn create_client_request(request_id: RequestId, external_id: &str) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Post, "clients").with_body(format!(
        r#"{{"officeId": 1, "legalFormId": 1, "firstname": "Petra", "lastname": "Yton",
            "externalId": "{external_id}", "dateFormat": "dd MMMM yyyy", "locale": "en",
            "active": false, "submittedOnDate": "04 March 2009"}}"#
    ))
}

pub fn update_client_request(request_id: RequestId, reference: RequestId) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Put, "clients/$.clientId")
        .with_reference(reference)
        .with_body(r#"{"firstname": "TestFirstName", "lastname": "TestLastName"}"#)
}

pub fn activate_client_request(request_id: RequestId, reference: RequestId) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Post, "clients/$.clientId?command=activate")
        .with_reference(reference)
        .with_body(r#"{"locale": "en", "dateFormat": "dd MMMM yyyy", "activationDate": "01 March 2011"}"#)
}

pub fn apply_loan_request(request_id: RequestId, reference: RequestId, product_id: i64) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Post, "loans")
        .with_reference(reference)
        .with_body(format!(
            r#"{{"dateFormat": "dd MMMM yyyy", "locale": "en_GB", "clientId": "$.clientId",
                "productId": {product_id}, "principal": "10,000.00", "loanTermFrequency": 10,
                "loanTermFrequencyType": 2, "loanType": "individual", "numberOfRepayments": 10,
                "expectedDisbursementDate": "10 Jun 2013", "submittedOnDate": "10 Jun 2013"}}"#
        ))
}

pub fn apply_loan_request_with_client_id(
    request_id: RequestId,
    client_id: i64,
    product_id: i64,
    principal: &str,
) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Post, "loans").with_body(format!(
        r#"{{"clientId": {client_id}, "productId": {product_id}, "principal": "{principal}",
            "loanType": "individual", "submittedOnDate": "10 Jun 2013"}}"#
    ))
}

pub fn apply_savings_request(request_id: RequestId, reference: RequestId, product_id: i64) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Post, "savingsaccounts")
        .with_reference(reference)
        .with_body(format!(
            r#"{{"clientId": "$.clientId", "productId": {product_id}, "locale": "en",
                "dateFormat": "dd MMMM yyyy", "submittedOnDate": "01 March 2011"}}"#
        ))
}

pub fn create_charge_request(request_id: RequestId, reference: RequestId) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Post, "loans/$.loanId/charges")
        .with_reference(reference)
        .with_body(
            r#"{"chargeId": "2", "locale": "en", "amount": "100", "dateFormat": "dd MMMM yyyy", "dueDate": "29 April 2013"}"#,
        )
}

pub fn collect_charges_request(request_id: RequestId, reference: RequestId) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Get, "loans/$.loanId/charges")
        .with_reference(reference)
        .with_body("{ }")
}

pub fn approve_loan_request(request_id: RequestId, reference: RequestId) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Post, "loans/$.loanId?command=approve")
        .with_reference(reference)
        .with_body(r#"{"locale": "en", "dateFormat": "dd MMMM yyyy", "approvedOnDate": "12 September 2013"}"#)
}

pub fn disburse_loan_request(request_id: RequestId, reference: RequestId) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Post, "loans/$.loanId?command=disburse")
        .with_reference(reference)
        .with_body(r#"{"locale": "en", "dateFormat": "dd MMMM yyyy", "actualDisbursementDate": "15 September 2013"}"#)
}

pub fn repay_loan_request(request_id: RequestId, reference: RequestId) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Post, "loans/$.loanId/transactions?command=repayment")
        .with_reference(reference)
        .with_body(r#"{"locale": "en", "dateFormat": "dd MMMM yyyy", "transactionDate": "15 September 2013", "transactionAmount": 500}"#)
}

pub fn get_transaction_by_id_request(request_id: RequestId, reference: RequestId) -> SubRequest {
    SubRequest::new(request_id, HttpMethod::Get, "loans/$.loanId/transactions/$.resourceId")
        .with_reference(reference)
        .with_body("{}")
}

pub fn get_loan_by_id_request(
    request_id: RequestId,
    reference: RequestId,
    query: Option<&str>,
) -> SubRequest {
    let relative_url = match query {
        Some(query) => format!("loans/$.loanId?{query}"),
        None => "loans/$.loanId".to_string(),
    };
    SubRequest::new(request_id, HttpMethod::Get, relative_url)
        .with_reference(reference)
        .with_body("{}")
}

/// Serialize a batch the way it travels over the wire
pub fn to_json_string(requests: &[SubRequest]) -> String {
    serde_json::to_string(requests).unwrap()
}
