//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse Ant-style path patterns (`/accounts/**`, `/accounts/{id}`)
//! - Match request paths segment by segment
//! - Extract template variables
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `*` matches exactly one segment, `**` zero or more
//! - Empty segments are ignored, so `/accounts/` matches like `/accounts`
//! - No regex to keep matching predictable

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when parsing a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("pattern '{pattern}' has a malformed segment '{segment}'")]
    MalformedSegment { pattern: String, segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`
    Any,
    /// `**`
    AnyDepth,
    /// `{name}`
    Variable(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute(pattern.to_string()));
        }

        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| parse_segment(pattern, s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match `path` and return the template variables, or `None` on mismatch.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut captured = Vec::new();
        if match_segments(&self.segments, &parts, &mut captured) {
            Some(captured.into_iter().collect())
        } else {
            None
        }
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segment(pattern: &str, segment: &str) -> Result<Segment, PatternError> {
    let malformed = || PatternError::MalformedSegment {
        pattern: pattern.to_string(),
        segment: segment.to_string(),
    };

    match segment {
        "*" => Ok(Segment::Any),
        "**" => Ok(Segment::AnyDepth),
        s if s.starts_with('{') && s.ends_with('}') => {
            let name = &s[1..s.len() - 1];
            if name.is_empty() || name.contains(['{', '}', '*']) {
                return Err(malformed());
            }
            Ok(Segment::Variable(name.to_string()))
        }
        s if s.contains(['{', '}', '*']) => Err(malformed()),
        s => Ok(Segment::Literal(s.to_string())),
    }
}

fn match_segments(pattern: &[Segment], path: &[&str], captured: &mut Vec<(String, String)>) -> bool {
    match (pattern.split_first(), path.split_first()) {
        (None, _) => path.is_empty(),
        (Some((Segment::AnyDepth, rest)), _) => (0..=path.len()).any(|skip| {
            let mark = captured.len();
            if match_segments(rest, &path[skip..], captured) {
                true
            } else {
                captured.truncate(mark);
                false
            }
        }),
        (Some(_), None) => false,
        (Some((Segment::Literal(expected), rest)), Some((head, tail))) => {
            expected == head && match_segments(rest, tail, captured)
        }
        (Some((Segment::Any, rest)), Some((_, tail))) => match_segments(rest, tail, captured),
        (Some((Segment::Variable(name), rest)), Some((head, tail))) => {
            captured.push((name.clone(), head.to_string()));
            if match_segments(rest, tail, captured) {
                true
            } else {
                captured.pop();
                false
            }
        }
    }
}
