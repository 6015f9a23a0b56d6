//! Invalidation patterns
//!
//! A pattern names either one object or every object below a directory.
//! Patterns render CDN-style with a leading slash: `/a/b.txt`, `/a/*`, and
//! `/*` for the whole tree. A literal `%` renders as `%25`, and an exact key
//! whose last segment is `*` renders that segment as `%2A`, so every rendered
//! form parses back to the pattern it came from.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const WILDCARD: &str = "*";
const ESCAPED_PERCENT: &str = "%25";
const ESCAPED_WILDCARD: &str = "%2A";

fn escape(path: &str) -> String {
    path.replace('%', ESCAPED_PERCENT)
}

fn escape_exact(path: &str) -> String {
    let escaped = escape(path);
    match escaped.rsplit_once('/') {
        Some((dir, WILDCARD)) => format!("{}/{}", dir, ESCAPED_WILDCARD),
        None if escaped == WILDCARD => ESCAPED_WILDCARD.to_string(),
        _ => escaped,
    }
}

fn unescape(rendered: &str) -> String {
    let mut out = String::with_capacity(rendered.len());
    let mut rest = rendered;
    while let Some(idx) = rest.find('%') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        if tail.starts_with(ESCAPED_PERCENT) {
            out.push('%');
            rest = &tail[ESCAPED_PERCENT.len()..];
        } else if tail.starts_with(ESCAPED_WILDCARD) {
            out.push('*');
            rest = &tail[ESCAPED_WILDCARD.len()..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvalidationPattern {
    /// A single object key
    Exact(String),
    /// Every key below a directory; the empty directory is the root
    Prefix(String),
}

impl InvalidationPattern {
    pub fn exact(path: impl Into<String>) -> Self {
        InvalidationPattern::Exact(path.into())
    }

    pub fn prefix(dir: impl Into<String>) -> Self {
        InvalidationPattern::Prefix(dir.into())
    }

    /// Whether this pattern invalidates `path`
    pub fn covers(&self, path: &str) -> bool {
        match self {
            InvalidationPattern::Exact(p) => p == path,
            InvalidationPattern::Prefix(dir) => {
                dir.is_empty()
                    || (path.len() > dir.len()
                        && path.starts_with(dir.as_str())
                        && path.as_bytes()[dir.len()] == b'/')
            }
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, InvalidationPattern::Prefix(_))
    }

    /// Key or directory without the leading slash or wildcard marker
    pub fn path(&self) -> &str {
        match self {
            InvalidationPattern::Exact(p) | InvalidationPattern::Prefix(p) => p,
        }
    }
}

impl fmt::Display for InvalidationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationPattern::Exact(path) => write!(f, "/{}", escape_exact(path)),
            InvalidationPattern::Prefix(dir) if dir.is_empty() => write!(f, "/{}", WILDCARD),
            InvalidationPattern::Prefix(dir) => write!(f, "/{}/{}", escape(dir), WILDCARD),
        }
    }
}

/// Parse error for a rendered pattern
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid invalidation pattern: {0}")]
pub struct PatternParseError(pub String);

impl FromStr for InvalidationPattern {
    type Err = PatternParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix('/').unwrap_or(s);
        if body.is_empty() {
            return Err(PatternParseError(s.to_string()));
        }
        if body == WILDCARD {
            return Ok(InvalidationPattern::Prefix(String::new()));
        }
        if let Some(dir) = body.strip_suffix("/*") {
            if dir.is_empty() {
                return Err(PatternParseError(s.to_string()));
            }
            return Ok(InvalidationPattern::Prefix(unescape(dir)));
        }
        Ok(InvalidationPattern::Exact(unescape(body)))
    }
}

// Ordered by rendered form so sorted output reads lexicographically
impl Ord for InvalidationPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string()
            .cmp(&other.to_string())
            .then_with(|| self.is_wildcard().cmp(&other.is_wildcard()))
    }
}

impl PartialOrd for InvalidationPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for InvalidationPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InvalidationPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
