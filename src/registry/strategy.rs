//! The uniform interface between the orchestrator and resource handlers.

use crate::constants::status;
use crate::error::HandlerError;
use crate::models::{HttpMethod, RequestId};
use crate::transaction::TransactionalStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// A fully resolved sub-request, as seen by a handler
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub request_id: RequestId,
    pub method: HttpMethod,
    /// Relative URL after reference resolution
    pub relative_url: String,
    /// Path portion without surrounding slashes
    pub path: String,
    /// Values captured by `{name}` pattern segments
    pub path_params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Value,
    pub headers: BTreeMap<String, String>,
}

impl CommandRequest {
    pub fn path_param(&self, name: &str) -> Result<&str, HandlerError> {
        self.path_params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| HandlerError::Internal(anyhow::anyhow!("route has no path parameter '{name}'")))
    }

    /// Numeric identifier captured from the path
    pub fn path_id(&self, name: &str) -> Result<i64, HandlerError> {
        let raw = self.path_param(name)?;
        raw.parse()
            .map_err(|_| HandlerError::validation(format!("path parameter '{name}' must be numeric, got '{raw}'")))
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn body_field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// Required string field of the body
    pub fn required_str(&self, name: &str) -> Result<&str, HandlerError> {
        self.body_field(name)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| HandlerError::validation(format!("the parameter '{name}' is mandatory")))
    }

    /// Required integer field of the body, accepting numeric strings
    pub fn required_i64(&self, name: &str) -> Result<i64, HandlerError> {
        let value = match self.body_field(name) {
            Some(Value::Number(number)) => number.as_i64(),
            Some(Value::String(text)) => text.trim().parse().ok(),
            _ => None,
        };
        value.ok_or_else(|| HandlerError::validation(format!("the parameter '{name}' must be an integer")))
    }
}

/// Raw result of a handler invocation
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutcome {
    pub status_code: u16,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl HandlerOutcome {
    pub fn new(status_code: u16, body: Option<Value>) -> Self {
        Self {
            status_code,
            body,
            headers: BTreeMap::new(),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(status::OK, Some(body))
    }

    pub fn created(body: Value) -> Self {
        Self::new(status::CREATED, Some(body))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// A resource operation the dispatch table can route to.
///
/// Every effect must go through `tx`, the unit of work opened by the
/// executor; nothing the handler does may outlive a rollback of it.
#[async_trait]
pub trait CommandStrategy<S: TransactionalStore>: Send + Sync {
    async fn execute(
        &self,
        request: &CommandRequest,
        tx: &mut S::Transaction,
    ) -> Result<HandlerOutcome, HandlerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> CommandRequest {
        CommandRequest {
            request_id: 1,
            method: HttpMethod::Post,
            relative_url: "loans/42".to_string(),
            path: "loans/42".to_string(),
            path_params: BTreeMap::from([
                ("loanId".to_string(), "42".to_string()),
                ("slug".to_string(), "abc".to_string()),
            ]),
            query: BTreeMap::from([("command".to_string(), "approve".to_string())]),
            body,
            headers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_path_accessors() {
        let req = request(Value::Null);
        assert_eq!(req.path_id("loanId").unwrap(), 42);
        assert_eq!(req.path_id("slug").unwrap_err().status_code(), 400);
        assert_eq!(req.path_param("missing").unwrap_err().status_code(), 500);
        assert_eq!(req.query_param("command"), Some("approve"));
    }

    #[test]
    fn test_body_accessors() {
        let req = request(json!({"clientId": "7", "productId": 3, "firstname": " ", "lastname": "Yton"}));
        assert_eq!(req.required_i64("clientId").unwrap(), 7);
        assert_eq!(req.required_i64("productId").unwrap(), 3);
        assert!(req.required_i64("lastname").is_err());
        assert!(req.required_str("firstname").is_err());
        assert_eq!(req.required_str("lastname").unwrap(), "Yton");
    }

    #[test]
    fn test_outcome_builders() {
        let outcome = HandlerOutcome::created(json!({"resourceId": 1})).with_header("Location", "clients/1");
        assert!(outcome.is_success());
        assert_eq!(outcome.status_code, 201);
        assert_eq!(outcome.headers.get("Location").map(String::as_str), Some("clients/1"));
        assert!(!HandlerOutcome::new(409, None).is_success());
    }
}
