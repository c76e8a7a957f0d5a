//! Tokenizer for reference tokens embedded in paths and body strings.
//!
//! ```text
//! $.loanId                 field of the declared reference
//! ${3}.changes.status      field of request 3
//! loans/$.loanId/charges   token ends at '/'
//! ```

use super::path::{self, FieldPath};
use crate::constants::tokens;
use crate::models::RequestId;
use thiserror::Error;

/// A single reference token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    /// Token text exactly as it appeared in the input
    pub raw: String,
    /// Explicitly named request, `None` for the declared reference
    pub target: Option<RequestId>,
    pub path: FieldPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Reference(ReferenceToken),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed reference token '{token}': {reason}")]
pub struct TokenError {
    pub token: String,
    pub reason: String,
}

/// Cheap pre-check used to skip tokenizing plain text
pub fn contains_reference(input: &str) -> bool {
    input.as_bytes().windows(2).any(|pair| {
        pair[0] == tokens::MARKER as u8
            && (pair[1] == tokens::DEFAULT_TARGET as u8 || pair[1] == tokens::EXPLICIT_TARGET_OPEN as u8)
    })
}

fn token_error(input: &str, start: usize, at: usize, reason: impl Into<String>) -> TokenError {
    let end = input[at.min(input.len())..]
        .chars()
        .next()
        .map_or(input.len(), |c| at + c.len_utf8());
    TokenError {
        token: input[start..end].to_string(),
        reason: reason.into(),
    }
}

/// Split `input` into literal runs and reference tokens.
///
/// A `$` that is not followed by `.` or `{` is literal text.
pub fn tokenize(input: &str) -> Result<Vec<Segment<'_>>, TokenError> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != tokens::MARKER as u8 {
            i += 1;
            continue;
        }

        let start = i;
        let (target, path_start) = match bytes.get(i + 1).map(|b| *b as char) {
            Some(tokens::DEFAULT_TARGET) => (None, i + 2),
            Some(tokens::EXPLICIT_TARGET_OPEN) => {
                let digits_start = i + 2;
                let mut j = digits_start;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j == digits_start {
                    return Err(token_error(input, start, j, "expected a request id after '${'"));
                }
                if bytes.get(j) != Some(&(tokens::EXPLICIT_TARGET_CLOSE as u8)) {
                    return Err(token_error(input, start, j, "missing closing '}'"));
                }
                if bytes.get(j + 1) != Some(&(tokens::DEFAULT_TARGET as u8)) {
                    return Err(token_error(input, start, j + 1, "expected '.' after the request id"));
                }
                let target = input[digits_start..j].parse::<RequestId>().map_err(|_| {
                    token_error(input, start, j, "request id out of range")
                })?;
                (Some(target), j + 2)
            }
            _ => {
                i += 1;
                continue;
            }
        };

        let (path, end) = path::scan(input, path_start)
            .map_err(|(reason, at)| token_error(input, start, at, reason))?;

        if literal_start < start {
            segments.push(Segment::Literal(&input[literal_start..start]));
        }
        segments.push(Segment::Reference(ReferenceToken {
            raw: input[start..end].to_string(),
            target,
            path,
        }));
        i = end;
        literal_start = end;
    }

    if literal_start < input.len() {
        segments.push(Segment::Literal(&input[literal_start..]));
    }

    Ok(segments)
}
