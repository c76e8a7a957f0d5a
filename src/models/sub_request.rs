//! # Sub-Request
//!
//! One entry of a batch envelope. The body may arrive either as an embedded
//! JSON value or as a string holding JSON (the form most batch clients send);
//! [`SubRequest::payload`] normalizes both into a single JSON value.

use super::method::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Caller-assigned identifier of a sub-request, unique within a batch
pub type RequestId = i64;

/// A single operation within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubRequest {
    /// Cross-reference key for later sub-requests
    pub request_id: RequestId,

    /// Resource path relative to the API root, may contain reference tokens
    pub relative_url: String,

    pub method: HttpMethod,

    /// Request payload, may contain reference tokens at any depth
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub body: Value,

    /// Sub-request whose response this one depends on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<RequestId>,

    /// Headers forwarded to the handler
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl SubRequest {
    /// Create a sub-request without body, reference or headers
    pub fn new(request_id: RequestId, method: HttpMethod, relative_url: impl Into<String>) -> Self {
        Self {
            request_id,
            relative_url: relative_url.into(),
            method,
            body: Value::Null,
            reference: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_reference(mut self, reference: RequestId) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The body as structured JSON.
    ///
    /// String bodies holding valid JSON are parsed, blank strings become
    /// `null`, and anything else is kept as raw text.
    pub fn payload(&self) -> Value {
        match &self.body {
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(raw.clone()))
                }
            }
            other => other.clone(),
        }
    }
}
