//! Version values and their total order.
//!
//! A version string is split into segments on `.`, `-`, `_` and `+`, and on
//! every boundary between digits and letters, so `1.0-rc1` becomes
//! `[1, 0, rc, 1]`. Segments compare as follows:
//!
//! - two numeric segments compare numerically;
//! - a numeric segment is greater than a textual one;
//! - textual segments compare by qualifier rank
//!   (`dev` < other text < `rc` < `snapshot` < `final` < `ga` < `release` < `sp`),
//!   unknown qualifiers compare case-insensitively among themselves.
//!
//! When one version is a prefix of the other, the longer one is greater if
//! its next segment is numeric (`1.0.1 > 1.0`) and smaller otherwise
//! (`1.0-rc < 1.0`). Versions that compare equal segment-wise (`1.0` and
//! `1.00`) are finally ordered by their source text, so the order is total
//! and consistent with equality.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GraftError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Number(u64),
    Text(String),
}

impl Segment {
    const fn is_numeric(&self) -> bool {
        matches!(self, Self::Number(_))
    }
}

fn qualifier_rank(text: &str) -> i8 {
    match text.to_ascii_lowercase().as_str() {
        "dev" => -1,
        "rc" => 1,
        "snapshot" => 2,
        "final" => 3,
        "ga" => 4,
        "release" => 5,
        "sp" => 6,
        _ => 0,
    }
}

fn compare_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Number(x), Segment::Number(y)) => x.cmp(y),
        (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
        (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
        (Segment::Text(x), Segment::Text(y)) => qualifier_rank(x)
            .cmp(&qualifier_rank(y))
            .then_with(|| x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase())),
    }
}

/// A parsed version with a total order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    source: String,
    segments: Vec<Segment>,
}

impl Version {
    /// Parses a version string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty or contains whitespace.
    pub fn parse(source: &str) -> Result<Self> {
        if source.is_empty() || source.chars().any(char::is_whitespace) {
            return Err(GraftError::Parse {
                kind: "version",
                input: source.to_string(),
            });
        }
        Ok(Self {
            source: source.to_string(),
            segments: split_segments(source),
        })
    }

    /// Returns the version as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns whether every textual qualifier denotes a release.
    ///
    /// `1.0`, `1.0-final` and `2.1.ga` are releases; `1.0-rc1` and
    /// `2.0-SNAPSHOT` are not.
    #[must_use]
    pub fn is_release(&self) -> bool {
        self.segments.iter().all(|s| match s {
            Segment::Number(_) => true,
            Segment::Text(t) => qualifier_rank(t) >= 3,
        })
    }

    /// Compares segment-wise, ignoring the source text tie-break.
    #[must_use]
    pub fn compare_semantically(&self, other: &Self) -> Ordering {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            let ord = compare_segments(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        let common = self.segments.len().min(other.segments.len());
        match self.segments.len().cmp(&other.segments.len()) {
            Ordering::Equal => Ordering::Equal,
            Ordering::Greater if self.segments[common].is_numeric() => Ordering::Greater,
            Ordering::Greater => Ordering::Less,
            Ordering::Less if other.segments[common].is_numeric() => Ordering::Less,
            Ordering::Less => Ordering::Greater,
        }
    }
}

fn split_segments(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_digits = false;
    let flush = |current: &mut String, digits: bool, segments: &mut Vec<Segment>| {
        if current.is_empty() {
            return;
        }
        let segment = if digits {
            current
                .parse::<u64>()
                .map_or_else(|_| Segment::Text(current.clone()), Segment::Number)
        } else {
            Segment::Text(current.clone())
        };
        segments.push(segment);
        current.clear();
    };
    for c in source.chars() {
        if matches!(c, '.' | '-' | '_' | '+') {
            flush(&mut current, current_digits, &mut segments);
            continue;
        }
        let digit = c.is_ascii_digit();
        if !current.is_empty() && digit != current_digits {
            flush(&mut current, current_digits, &mut segments);
        }
        current_digits = digit;
        current.push(c);
    }
    flush(&mut current, current_digits, &mut segments);
    segments
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_semantically(other)
            .then_with(|| self.source.cmp(&other.source))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl FromStr for Version {
    type Err = GraftError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = GraftError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.source
    }
}
