//! # Response Assembler
//!
//! Turns handler outcomes and per sub-request failures into [`SubResponse`]s.

use crate::constants::{CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE};
use crate::error::{HandlerError, SubRequestError};
use crate::models::{RequestId, SubResponse};
use crate::registry::HandlerOutcome;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    /// Absent bodies become `{}`; handler headers are kept and a JSON
    /// content type is added unless the handler set one.
    pub fn from_outcome(request_id: RequestId, outcome: HandlerOutcome) -> SubResponse {
        SubResponse {
            request_id,
            status_code: outcome.status_code,
            body: outcome.body.unwrap_or_else(|| Value::Object(Map::new())),
            headers: Self::with_content_type(outcome.headers),
        }
    }

    /// Error-shaped response: `{"errorType", "message", "requestId"}`, or the
    /// body a handler rejection supplied itself. Rejection headers are kept.
    pub fn from_error(request_id: RequestId, error: &SubRequestError) -> SubResponse {
        let (body, headers) = match error {
            SubRequestError::Handler(HandlerError::Rejected { body, headers, .. }) => (
                body.clone().unwrap_or_else(|| {
                    Self::error_body(request_id, error.error_type(), &error.to_string())
                }),
                headers.clone(),
            ),
            _ => (
                Self::error_body(request_id, error.error_type(), &error.to_string()),
                BTreeMap::new(),
            ),
        };

        SubResponse {
            request_id,
            status_code: error.status_code(),
            body,
            headers: Self::with_content_type(headers),
        }
    }

    pub fn error_body(request_id: RequestId, error_type: &str, message: &str) -> Value {
        json!({
            "errorType": error_type,
            "message": message,
            "requestId": request_id,
        })
    }

    fn with_content_type(mut headers: BTreeMap<String, String>) -> BTreeMap<String, String> {
        let has_content_type = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER));
        if !has_content_type {
            headers.insert(CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string());
        }
        headers
    }
}
