//! # Reference Resolver
//!
//! Rewrites reference tokens in a sub-request's relative URL and body into
//! concrete values taken from sub-responses produced earlier in the same
//! batch.
//!
//! ## Rules
//!
//! - `$.path` reads from the sub-request named by the `reference` attribute,
//!   `${id}.path` from request `id`.
//! - A body string consisting of exactly one token is replaced by the
//!   referenced JSON value, keeping its type. Tokens inside longer text are
//!   spliced as text and must point at a string, number or boolean.
//! - Object keys are never rewritten; values and array elements are, at any
//!   depth.
//! - Only successful, already-executed sub-requests can be referenced.
//!
//! Resolution is a pure function of the request and the ledger.

pub mod ledger;
pub mod path;
pub mod token;

pub use ledger::{LedgerEntry, ResponseLedger};
pub use path::{FieldPath, PathSegment};
pub use token::{contains_reference, tokenize, ReferenceToken, Segment, TokenError};

use crate::error::ResolutionError;
use crate::models::{RequestId, SubRequest};
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver {
    /// Explicit `${id}` targets must match the declared reference, and
    /// need one to be declared
    strict_references: bool,
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self {
            strict_references: true,
        }
    }
}

impl ReferenceResolver {
    pub fn new(strict_references: bool) -> Self {
        Self { strict_references }
    }

    pub fn strict_references(&self) -> bool {
        self.strict_references
    }

    /// The declared `reference` must name an earlier successful sub-request,
    /// whether or not any token uses it.
    pub fn check_declared_reference(
        &self,
        request: &SubRequest,
        ledger: &ResponseLedger,
    ) -> Result<(), ResolutionError> {
        let Some(target) = request.reference else {
            return Ok(());
        };
        let token = format!("reference={target}");
        Self::produced_body(request, target, &token, ledger).map(|_| ())
    }

    /// Resolve every token in the relative URL
    pub fn resolve_url(
        &self,
        request: &SubRequest,
        ledger: &ResponseLedger,
    ) -> Result<String, ResolutionError> {
        self.resolve_text(&request.relative_url, request, ledger)
    }

    /// Resolve every token in the normalized body
    pub fn resolve_body(
        &self,
        request: &SubRequest,
        ledger: &ResponseLedger,
    ) -> Result<Value, ResolutionError> {
        self.resolve_value(&request.payload(), request, ledger)
    }

    /// Splice token values into `text`
    pub fn resolve_text(
        &self,
        text: &str,
        request: &SubRequest,
        ledger: &ResponseLedger,
    ) -> Result<String, ResolutionError> {
        if !contains_reference(text) {
            return Ok(text.to_string());
        }

        let segments = tokenize(text).map_err(|err| Self::malformed(request, err))?;
        let mut resolved = String::with_capacity(text.len());
        for segment in &segments {
            match segment {
                Segment::Literal(literal) => resolved.push_str(literal),
                Segment::Reference(token) => {
                    let (target, value) = self.lookup(token, request, ledger)?;
                    resolved.push_str(&Self::render_scalar(value, token, target, request)?);
                }
            }
        }
        Ok(resolved)
    }

    /// Resolve tokens in string leaves of `value`, recursing into objects and arrays
    pub fn resolve_value(
        &self,
        value: &Value,
        request: &SubRequest,
        ledger: &ResponseLedger,
    ) -> Result<Value, ResolutionError> {
        match value {
            Value::String(text) => {
                if !contains_reference(text) {
                    return Ok(value.clone());
                }
                let segments = tokenize(text).map_err(|err| Self::malformed(request, err))?;
                if let [Segment::Reference(token)] = segments.as_slice() {
                    let (_, referenced) = self.lookup(token, request, ledger)?;
                    return Ok(referenced.clone());
                }
                self.resolve_text(text, request, ledger).map(Value::String)
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item, request, ledger))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(members) => members
                .iter()
                .map(|(key, member)| {
                    self.resolve_value(member, request, ledger)
                        .map(|resolved| (key.clone(), resolved))
                })
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(Value::Object),
            _ => Ok(value.clone()),
        }
    }

    /// Find the value a token points at
    fn lookup<'l>(
        &self,
        token: &ReferenceToken,
        request: &SubRequest,
        ledger: &'l ResponseLedger,
    ) -> Result<(RequestId, &'l Value), ResolutionError> {
        let target = match (token.target, request.reference) {
            (Some(explicit), Some(declared)) if self.strict_references && explicit != declared => {
                return Err(ResolutionError::UndeclaredTarget {
                    request_id: request.request_id,
                    token: token.raw.clone(),
                    target: explicit,
                    declared,
                });
            }
            (Some(explicit), None) if self.strict_references => {
                return Err(ResolutionError::UnscopedTarget {
                    request_id: request.request_id,
                    token: token.raw.clone(),
                    target: explicit,
                });
            }
            (Some(explicit), _) => explicit,
            (None, Some(declared)) => declared,
            (None, None) => {
                return Err(ResolutionError::MissingReference {
                    request_id: request.request_id,
                    token: token.raw.clone(),
                });
            }
        };

        let body = Self::produced_body(request, target, &token.raw, ledger)?;
        let value = token.path.evaluate(body).ok_or_else(|| ResolutionError::FieldNotFound {
            request_id: request.request_id,
            token: token.raw.clone(),
            target,
            path: token.path.to_string(),
        })?;

        Ok((target, value))
    }

    fn produced_body<'l>(
        request: &SubRequest,
        target: RequestId,
        token: &str,
        ledger: &'l ResponseLedger,
    ) -> Result<&'l Value, ResolutionError> {
        let request_id = request.request_id;
        let token = token.to_string();

        if target == request_id {
            return Err(ResolutionError::ForwardReference {
                request_id,
                token,
                target,
            });
        }

        match ledger.lookup(target) {
            LedgerEntry::Produced(response) => Ok(&response.body),
            LedgerEntry::Failed => Err(ResolutionError::FailedDependency {
                request_id,
                token,
                target,
            }),
            LedgerEntry::Pending => Err(ResolutionError::ForwardReference {
                request_id,
                token,
                target,
            }),
            LedgerEntry::Unknown => Err(ResolutionError::UnknownRequest {
                request_id,
                token,
                target,
            }),
        }
    }

    fn render_scalar(
        value: &Value,
        token: &ReferenceToken,
        target: RequestId,
        request: &SubRequest,
    ) -> Result<String, ResolutionError> {
        match value {
            Value::String(text) => Ok(text.clone()),
            Value::Number(number) => Ok(number.to_string()),
            Value::Bool(flag) => Ok(flag.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => Err(ResolutionError::NonScalarValue {
                request_id: request.request_id,
                token: token.raw.clone(),
                target,
                path: token.path.to_string(),
            }),
        }
    }

    fn malformed(request: &SubRequest, err: TokenError) -> ResolutionError {
        ResolutionError::MalformedToken {
            request_id: request.request_id,
            token: err.token,
            reason: err.reason,
        }
    }
}
