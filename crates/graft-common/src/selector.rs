//! Version selectors and constraints, parsed with `nom`.
//!
//! Supported notations:
//!
//! | notation                         | meaning                                   |
//! |----------------------------------|-------------------------------------------|
//! | `1.2`                            | exactly `1.2`                             |
//! | `1.+`, `1.2+`                    | any version starting with the prefix      |
//! | `+`, `latest.integration`        | the highest available version             |
//! | `latest.release`                 | the highest version without pre-release qualifiers |
//! | `[1.0,2.0)`, `]1.0,2.0[`, `(,1.5]` | a range with inclusive/exclusive bounds |
//!
//! A constraint suffixed with `!!` is *strict*.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_while1},
    character::complete::{multispace0, one_of},
    combinator::opt,
    sequence::delimited,
};
use serde::{Deserialize, Serialize};

use crate::error::{GraftError, Result};
use crate::version::Version;

/// One end of a version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    /// Boundary version.
    pub version: Version,
    /// Whether the boundary itself is accepted.
    pub inclusive: bool,
}

/// A predicate over available versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSelector {
    /// Exactly one version.
    Exact(Version),
    /// Any version whose text starts with the prefix.
    Prefix(String),
    /// The highest available version, optionally restricted to releases.
    Latest {
        /// Reject versions carrying pre-release qualifiers.
        release_only: bool,
    },
    /// A bounded or half-open interval.
    Range {
        /// Lower bound, or `None` for unbounded.
        lower: Option<Bound>,
        /// Upper bound, or `None` for unbounded.
        upper: Option<Bound>,
    },
}

impl VersionSelector {
    /// Returns whether `candidate` satisfies this selector.
    #[must_use]
    pub fn accepts(&self, candidate: &Version) -> bool {
        match self {
            Self::Exact(v) => v.compare_semantically(candidate) == Ordering::Equal,
            Self::Prefix(prefix) => candidate.as_str().starts_with(prefix.as_str()),
            Self::Latest { release_only } => !release_only || candidate.is_release(),
            Self::Range { lower, upper } => {
                let above = lower.as_ref().is_none_or(|b| {
                    match candidate.compare_semantically(&b.version) {
                        Ordering::Greater => true,
                        Ordering::Equal => b.inclusive,
                        Ordering::Less => false,
                    }
                });
                let below = upper.as_ref().is_none_or(|b| {
                    match candidate.compare_semantically(&b.version) {
                        Ordering::Less => true,
                        Ordering::Equal => b.inclusive,
                        Ordering::Greater => false,
                    }
                });
                above && below
            }
        }
    }

    /// Returns whether the selector needs the list of available versions.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        !matches!(self, Self::Exact(_))
    }

    /// Returns the highest accepted version from `candidates`.
    #[must_use]
    pub fn select_highest<'a>(&self, candidates: &'a [Version]) -> Option<&'a Version> {
        candidates.iter().filter(|v| self.accepts(v)).max()
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v}"),
            Self::Prefix(p) => write!(f, "{p}+"),
            Self::Latest { release_only: true } => write!(f, "latest.release"),
            Self::Latest { release_only: false } => write!(f, "latest.integration"),
            Self::Range { lower, upper } => {
                match lower {
                    Some(b) if b.inclusive => write!(f, "[{}", b.version)?,
                    Some(b) => write!(f, "({}", b.version)?,
                    None => write!(f, "(")?,
                }
                write!(f, ",")?;
                match upper {
                    Some(b) if b.inclusive => write!(f, "{}]", b.version),
                    Some(b) => write!(f, "{})", b.version),
                    None => write!(f, ")"),
                }
            }
        }
    }
}

fn range_version(input: &str) -> IResult<&str, &str> {
    delimited(
        multispace0,
        take_while1(|c: char| !matches!(c, ',' | '[' | ']' | '(' | ')') && !c.is_whitespace()),
        multispace0,
    )
    .parse(input)
}

/// Parses a Maven-style range such as `[1.0,2.0)`.
fn range(input: &str) -> IResult<&str, (char, Option<&str>, Option<&str>, char)> {
    let (input, open) = one_of("[(]")(input)?;
    let (input, lower) = opt(range_version).parse(input)?;
    let (input, _) = tag(",")(input)?;
    let (input, upper) = opt(range_version).parse(input)?;
    let (input, close) = one_of("])[")(input)?;
    Ok((input, (open, lower, upper, close)))
}

fn parse_bound(text: Option<&str>, inclusive: bool) -> Result<Option<Bound>> {
    text.map(|t| {
        Ok(Bound {
            version: Version::parse(t)?,
            inclusive,
        })
    })
    .transpose()
}

/// Parses selector notations into [`VersionSelector`]s.
///
/// Resolution strategies carry a scheme so the notation accepted by a build
/// is fixed for the duration of a resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionSelectorScheme;

impl VersionSelectorScheme {
    /// Parses a selector.
    ///
    /// # Errors
    ///
    /// Returns an error for empty input, malformed ranges, or ranges whose
    /// lower bound exceeds the upper bound.
    pub fn parse_selector(self, notation: &str) -> Result<VersionSelector> {
        let notation = notation.trim();
        let parse_err = || GraftError::Parse {
            kind: "version selector",
            input: notation.to_string(),
        };
        if notation.is_empty() {
            return Err(parse_err());
        }
        match notation {
            "+" | "latest.integration" => return Ok(VersionSelector::Latest { release_only: false }),
            "latest.release" => return Ok(VersionSelector::Latest { release_only: true }),
            _ => {}
        }
        if notation.starts_with(['[', '(', ']']) {
            let (rest, (open, lower, upper, close)) = range(notation).map_err(|_| parse_err())?;
            if !rest.trim().is_empty() || (lower.is_none() && upper.is_none()) {
                return Err(parse_err());
            }
            let lower = parse_bound(lower, open == '[')?;
            let upper = parse_bound(upper, close == ']')?;
            if let (Some(l), Some(u)) = (&lower, &upper) {
                if l.version.compare_semantically(&u.version) == Ordering::Greater {
                    return Err(parse_err());
                }
            }
            return Ok(VersionSelector::Range { lower, upper });
        }
        if let Some(prefix) = notation.strip_suffix('+') {
            return Ok(VersionSelector::Prefix(prefix.to_string()));
        }
        Ok(VersionSelector::Exact(Version::parse(notation)?))
    }
}

/// A selector plus the strictness flag carried by a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionConstraint {
    selector: VersionSelector,
    strictly: bool,
}

impl VersionConstraint {
    /// Creates a non-strict constraint.
    #[must_use]
    pub const fn prefer(selector: VersionSelector) -> Self {
        Self {
            selector,
            strictly: false,
        }
    }

    /// Creates a strict constraint.
    #[must_use]
    pub const fn strictly(selector: VersionSelector) -> Self {
        Self {
            selector,
            strictly: true,
        }
    }

    /// Returns the selector.
    #[must_use]
    pub const fn selector(&self) -> &VersionSelector {
        &self.selector
    }

    /// Returns whether the constraint is strict.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strictly
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        if self.strictly {
            write!(f, "!!")?;
        }
        Ok(())
    }
}

impl FromStr for VersionConstraint {
    type Err = GraftError;

    fn from_str(s: &str) -> Result<Self> {
        let scheme = VersionSelectorScheme;
        match s.trim().strip_suffix("!!") {
            Some(strict) => Ok(Self::strictly(scheme.parse_selector(strict)?)),
            None => Ok(Self::prefer(scheme.parse_selector(s)?)),
        }
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = GraftError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VersionConstraint> for String {
    fn from(value: VersionConstraint) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> VersionSelector {
        VersionSelectorScheme.parse_selector(s).expect("valid selector")
    }

    fn v(s: &str) -> Version {
        Version::parse(s).expect("valid version")
    }

    #[test]
    fn exact_selector_accepts_semantic_equal() {
        let s = sel("1.0");
        assert!(s.accepts(&v("1.0")));
        assert!(s.accepts(&v("1.00")));
        assert!(!s.accepts(&v("1.0.1")));
        assert!(!s.is_dynamic());
    }

    #[test]
    fn half_open_range() {
        let s = sel("[1.0,2.0)");
        assert!(s.accepts(&v("1.0")));
        assert!(s.accepts(&v("1.9.9")));
        assert!(!s.accepts(&v("2.0")));
        assert!(!s.accepts(&v("0.9")));
        assert_eq!(s.to_string(), "[1.0,2.0)");
    }

    #[test]
    fn reversed_brackets_are_exclusive() {
        let s = sel("]1.0,2.0[");
        assert!(!s.accepts(&v("1.0")));
        assert!(s.accepts(&v("1.5")));
        assert!(!s.accepts(&v("2.0")));
    }

    #[test]
    fn unbounded_lower_range() {
        let s = sel("(,1.5]");
        assert!(s.accepts(&v("0.1")));
        assert!(s.accepts(&v("1.5")));
        assert!(!s.accepts(&v("1.6")));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(VersionSelectorScheme.parse_selector("[2.0,1.0]").is_err());
        assert!(VersionSelectorScheme.parse_selector("[,]").is_err());
        assert!(VersionSelectorScheme.parse_selector("[1.0,2.0").is_err());
    }

    #[test]
    fn prefix_and_latest() {
        let candidates = vec![v("1.1"), v("1.2"), v("2.0-rc1"), v("1.10")];
        assert_eq!(sel("1.+").select_highest(&candidates), Some(&v("1.10")));
        assert_eq!(sel("+").select_highest(&candidates), Some(&v("2.0-rc1")));
        assert_eq!(
            sel("latest.release").select_highest(&candidates),
            Some(&v("1.10"))
        );
        assert_eq!(sel("3.+").select_highest(&candidates), None);
    }

    #[test]
    fn strict_constraint_notation() {
        let c: VersionConstraint = "1.5!!".parse().expect("parse");
        assert!(c.is_strict());
        assert_eq!(c.selector(), &sel("1.5"));
        assert_eq!(c.to_string(), "1.5!!");

        let json = serde_json::to_string(&c).expect("serialize");
        assert_eq!(json, "\"1.5!!\"");
    }
}
