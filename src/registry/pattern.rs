//! Path patterns for the dispatch table.
//!
//! A pattern is a `/`-separated list of literal segments and `{name}`
//! parameters, optionally followed by fixed query constraints:
//! `loans/{loanId}?command=approve` only matches when the request's query
//! contains `command=approve`.

use crate::error::RegistryError;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    Literal(String),
    Param(String),
}

/// How specific a pattern is; more specific patterns are tried first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    pub literals: usize,
    pub query_constraints: usize,
    pub fixed_prefix: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<PatternSegment>,
    query: Vec<(String, String)>,
}

/// Split a relative URL into trimmed path segments and a decoded query map
pub fn split_relative_url(relative_url: &str) -> (String, Vec<String>, BTreeMap<String, String>) {
    let (path, query) = relative_url.split_once('?').unwrap_or((relative_url, ""));
    let path = path.trim_matches('/').to_string();
    let segments = if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').map(str::to_string).collect()
    };
    let query = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    (path, segments, query)
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let (path, query) = pattern.split_once('?').unwrap_or((pattern, ""));
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(invalid("pattern has no path segments"));
        }

        let mut segments = Vec::new();
        for segment in path.split('/') {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid("parameter names must be non-empty identifiers"));
                }
                let duplicate = segments
                    .iter()
                    .any(|existing| matches!(existing, PatternSegment::Param(n) if n == name));
                if duplicate {
                    return Err(invalid("duplicate parameter name"));
                }
                segments.push(PatternSegment::Param(name.to_string()));
            } else if segment.contains('{') || segment.contains('}') {
                return Err(invalid("unbalanced braces"));
            } else {
                segments.push(PatternSegment::Literal(segment.to_string()));
            }
        }

        let mut constraints: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        if constraints.iter().any(|(key, _)| key.is_empty()) {
            return Err(invalid("empty query constraint name"));
        }
        constraints.sort();

        Ok(Self {
            raw: pattern.to_string(),
            segments,
            query: constraints,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    pub fn specificity(&self) -> Specificity {
        Specificity {
            literals: self
                .segments
                .iter()
                .filter(|s| matches!(s, PatternSegment::Literal(_)))
                .count(),
            query_constraints: self.query.len(),
            fixed_prefix: self
                .segments
                .iter()
                .take_while(|s| matches!(s, PatternSegment::Literal(_)))
                .count(),
        }
    }

    /// Normalized form used to detect routes that can never be told apart
    pub fn shape(&self) -> String {
        let path = self
            .segments
            .iter()
            .map(|segment| match segment {
                PatternSegment::Literal(literal) => literal.as_str(),
                PatternSegment::Param(_) => "{}",
            })
            .collect::<Vec<_>>()
            .join("/");
        let query = self
            .query
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{path}?{query}")
    }

    /// Match already-split path segments and query, returning captured parameters
    pub fn matches(
        &self,
        segments: &[String],
        query: &BTreeMap<String, String>,
    ) -> Option<BTreeMap<String, String>> {
        if segments.len() != self.segments.len() {
            return None;
        }

        let satisfied = self
            .query
            .iter()
            .all(|(key, value)| query.get(key).is_some_and(|actual| actual == value));
        if !satisfied {
            return None;
        }

        let mut params = BTreeMap::new();
        for (pattern, actual) in self.segments.iter().zip(segments) {
            match pattern {
                PatternSegment::Literal(literal) if literal == actual => {}
                PatternSegment::Literal(_) => return None,
                PatternSegment::Param(_) if actual.is_empty() => return None,
                PatternSegment::Param(name) => {
                    params.insert(name.clone(), actual.clone());
                }
            }
        }
        Some(params)
    }

    /// Descending specificity, for sorting
    pub fn cmp_specificity(&self, other: &Self) -> Ordering {
        other.specificity().cmp(&self.specificity())
    }
}
