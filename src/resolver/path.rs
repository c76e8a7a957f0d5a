//! Field-path expressions evaluated against sub-response bodies.
//!
//! Grammar: `segment ('.' segment)*`, where a segment is an identifier made of
//! ASCII letters, digits and `_`, optionally followed by `[index]` selectors.

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member lookup
    Key(String),
    /// Array element lookup
    Index(usize),
}

/// Parsed path such as `changes.locale` or `charges[0].id`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

pub(crate) fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Scan a path starting at byte offset `start`.
///
/// Returns the path and the offset just past it. The scan stops at the first
/// byte that cannot continue the path; a trailing `.` that is not followed by
/// an identifier is left unconsumed. Errors carry a reason and the offset of
/// the offending byte.
pub(crate) fn scan(input: &str, start: usize) -> Result<(FieldPath, usize), (String, usize)> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut i = start;

    loop {
        let ident_start = i;
        while i < bytes.len() && is_ident_byte(bytes[i]) {
            i += 1;
        }
        if i == ident_start {
            return Err(("expected a field name".to_string(), i));
        }
        segments.push(PathSegment::Key(input[ident_start..i].to_string()));

        while bytes.get(i) == Some(&b'[') {
            let digits_start = i + 1;
            let mut j = digits_start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j == digits_start {
                return Err(("expected an array index".to_string(), j));
            }
            if bytes.get(j) != Some(&b']') {
                return Err(("unterminated array index".to_string(), j));
            }
            let index = input[digits_start..j]
                .parse::<usize>()
                .map_err(|_| ("array index out of range".to_string(), digits_start))?;
            segments.push(PathSegment::Index(index));
            i = j + 1;
        }

        match (bytes.get(i), bytes.get(i + 1)) {
            (Some(b'.'), Some(next)) if is_ident_byte(*next) => i += 1,
            _ => break,
        }
    }

    Ok((FieldPath { segments }, i))
}

impl FieldPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walk `root` along this path
    pub fn evaluate<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| match segment {
                PathSegment::Key(key) => current.as_object()?.get(key),
                PathSegment::Index(index) => current.as_array()?.get(*index),
            })
    }
}

impl std::str::FromStr for FieldPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, end) = scan(s, 0).map_err(|(reason, at)| format!("{reason} at offset {at}"))?;
        if end != s.len() {
            return Err(format!("unexpected character at offset {end}"));
        }
        Ok(path)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
