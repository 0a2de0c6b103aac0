//! Immutable attribute sets and attribute-based matching.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable, ordered set of `key=value` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    /// The empty attribute set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns a copy with one more attribute, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.0.insert(key.into(), value.into());
        self
    }

    /// Returns a copy where the attributes of `other` override ours.
    #[must_use]
    pub fn merged_with(&self, other: &Self) -> Self {
        let mut merged = self.0.clone();
        merged.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(merged)
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns whether no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Scores this set as a candidate for `requested`.
    ///
    /// Returns `None` when some requested attribute is present with a
    /// different value. Otherwise returns how many requested attributes the
    /// candidate provides; attributes the candidate does not declare are
    /// compatible but score nothing.
    #[must_use]
    pub fn match_score(&self, requested: &Self) -> Option<usize> {
        let mut score = 0;
        for (key, wanted) in &requested.0 {
            match self.0.get(key) {
                Some(actual) if actual == wanted => score += 1,
                Some(_) => return None,
                None => {}
            }
        }
        Some(score)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}

/// Selects the best matches for `requested` among `candidates`.
///
/// Incompatible candidates are dropped; among the compatible ones only
/// those with the highest score survive. An empty result means no match,
/// more than one element means the request is ambiguous.
pub fn best_matches<'a, T>(
    requested: &Attributes,
    candidates: &'a [T],
    attributes_of: impl Fn(&T) -> &Attributes,
) -> Vec<&'a T> {
    let scored: Vec<(usize, &T)> = candidates
        .iter()
        .filter_map(|c| attributes_of(c).match_score(requested).map(|s| (s, c)))
        .collect();
    let Some(best) = scored.iter().map(|(s, _)| *s).max() else {
        return Vec::new();
    };
    scored
        .into_iter()
        .filter(|(s, _)| *s == best)
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    #[test]
    fn mismatching_value_is_incompatible() {
        let candidate = attrs(&[("usage", "runtime")]);
        assert_eq!(candidate.match_score(&attrs(&[("usage", "api")])), None);
    }

    #[test]
    fn missing_attribute_is_compatible() {
        let candidate = attrs(&[("usage", "api")]);
        let requested = attrs(&[("usage", "api"), ("platform", "jvm")]);
        assert_eq!(candidate.match_score(&requested), Some(1));
    }

    #[test]
    fn best_match_prefers_more_specific_candidate() {
        let candidates = vec![
            attrs(&[("usage", "api")]),
            attrs(&[("usage", "api"), ("platform", "jvm")]),
            attrs(&[("usage", "runtime")]),
        ];
        let requested = attrs(&[("usage", "api"), ("platform", "jvm")]);
        let best = best_matches(&requested, &candidates, |a| a);
        assert_eq!(best, vec![&candidates[1]]);
    }

    #[test]
    fn equal_scores_are_all_returned() {
        let candidates = vec![attrs(&[("usage", "api")]), attrs(&[("usage", "api")])];
        let best = best_matches(&attrs(&[("usage", "api")]), &candidates, |a| a);
        assert_eq!(best.len(), 2);
    }

    #[test]
    fn merge_overrides_and_displays_sorted() {
        let base = attrs(&[("usage", "runtime"), ("b", "1")]);
        let merged = base.merged_with(&attrs(&[("usage", "api")]));
        assert_eq!(merged.get("usage"), Some("api"));
        assert_eq!(merged.to_string(), "{b=1, usage=api}");
    }
}
