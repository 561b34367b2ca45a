//! Composite parameter-name parsing.
//!
//! A composite key addresses a slot in the target graph: `.` descends into
//! a nested field, `[idx]` (possibly repeated) addresses ordered-container
//! elements, and `(key)` addresses a map entry. Mapped access is syntactic
//! sugar: `sea(over).mystic` is rewritten to `sea.over.mystic` during
//! parsing and the schema decides at bind time that `over` is a literal map
//! key rather than a bean property.
//!
//! Index range and path depth are validated here, before the binder
//! allocates anything, so adversarial names (`list[999999]`, hundred-level
//! nesting) are rejected without touching the target tree.

use std::fmt;

use smallvec::SmallVec;

use crate::{error::BindError, options::BindOptions};

/// One step of a parsed composite key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain nested-field access (`sea` in `sea.land`). Under a map-typed
    /// node the name is a literal map key instead.
    Field { name: String },
    /// Indexed access with one index per dimension (`sea[0][1]`).
    Indexed {
        name: String,
        indices: SmallVec<[usize; 2]>,
    },
}

impl Segment {
    /// Property (or map-key) name addressed by this segment.
    pub fn name(&self) -> &str {
        match self {
            Segment::Field { name } => name,
            Segment::Indexed { name, .. } => name,
        }
    }
}

/// Ordered segments of one composite key. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<Segment>,
}

impl PropertyPath {
    /// Parses a composite key, validating index range and depth against the
    /// configured limits.
    pub fn parse(name: &str, options: &BindOptions) -> Result<Self, BindError> {
        let mut segments = Vec::new();
        let mut rem = name.to_string();

        loop {
            if rem.is_empty() {
                return Err(syntax(name, "empty path segment"));
            }
            let Some(pos) = rem.find(['.', '[', '(']) else {
                segments.push(Segment::Field { name: rem });
                break;
            };
            match &rem[pos..pos + 1] {
                "." => {
                    if pos == 0 {
                        return Err(syntax(name, "empty segment before `.`"));
                    }
                    let front = rem[..pos].to_string();
                    let rest = rem[pos + 1..].to_string();
                    if rest.is_empty() {
                        return Err(syntax(name, "trailing `.`"));
                    }
                    segments.push(Segment::Field { name: front });
                    rem = rest;
                }
                "[" => {
                    if pos == 0 {
                        return Err(syntax(name, "missing property name before `[`"));
                    }
                    let front = rem[..pos].to_string();
                    let mut rest = &rem[pos..];
                    let mut indices = SmallVec::new();
                    while let Some(body) = rest.strip_prefix('[') {
                        let Some(close) = body.find(']') else {
                            return Err(syntax(name, "missing closing `]`"));
                        };
                        indices.push(parse_index(name, &body[..close], options)?);
                        rest = &body[close + 1..];
                    }
                    segments.push(Segment::Indexed {
                        name: front,
                        indices,
                    });
                    if rest.is_empty() {
                        break;
                    } else if let Some(r) = rest.strip_prefix('.') {
                        if r.is_empty() {
                            return Err(syntax(name, "trailing `.`"));
                        }
                        rem = r.to_string();
                    } else if rest.starts_with('(') {
                        // mapped access on the addressed element; the key
                        // becomes the next field segment
                        rem = rest.to_string();
                        let (key, after) = split_map_key(name, &rem)?;
                        rem = format!("{key}{after}");
                    } else {
                        return Err(syntax(name, "unexpected character after `]`"));
                    }
                }
                _ => {
                    // `(` — rewrite mapped access into nested field access
                    // and re-parse the remainder
                    let front = rem[..pos].to_string();
                    if front.is_empty() {
                        return Err(syntax(name, "missing property name before `(`"));
                    }
                    let (key, after) = split_map_key(name, &rem[pos..])?;
                    rem = format!("{front}.{key}{after}");
                }
            }
        }

        if segments.len() > options.max_path_depth {
            return Err(syntax(name, "path exceeds maximum depth"));
        }
        Ok(PropertyPath { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Field { name } => f.write_str(name)?,
                Segment::Indexed { name, indices } => {
                    f.write_str(name)?;
                    for idx in indices {
                        write!(f, "[{idx}]")?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Splits `(key)rest`, returning the key and the remainder after `)`.
fn split_map_key<'a>(full: &str, rem: &'a str) -> Result<(&'a str, &'a str), BindError> {
    let body = &rem[1..];
    let Some(close) = body.find(')') else {
        return Err(syntax(full, "missing closing `)`"));
    };
    let key = &body[..close];
    if key.is_empty() {
        return Err(syntax(full, "empty map key"));
    }
    Ok((key, &body[close + 1..]))
}

fn parse_index(full: &str, token: &str, options: &BindOptions) -> Result<usize, BindError> {
    if token.is_empty() {
        return Err(syntax(full, "empty index"));
    }
    let Ok(index) = token.parse::<i64>() else {
        if token.chars().all(|c| c.is_ascii_digit()) {
            // all-digit token too large for i64 is over any sane ceiling
            return Err(BindError::IndexRange {
                name: full.to_string(),
                index: i64::MAX,
                limit: options.index_size_limit,
            });
        }
        return Err(syntax(full, "non-numeric index"));
    };
    if index < 0 || index as usize >= options.index_size_limit {
        return Err(BindError::IndexRange {
            name: full.to_string(),
            index,
            limit: options.index_size_limit,
        });
    }
    Ok(index as usize)
}

fn syntax(name: &str, reason: &str) -> BindError {
    BindError::PathSyntax {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
