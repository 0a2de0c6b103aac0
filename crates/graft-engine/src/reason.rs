//! Why a node was selected.

use std::fmt;

use serde::{Serialize, Serializer};

/// A single cause contributing to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectionCause {
    /// The resolution root.
    Root,
    /// Requested by a dependency edge.
    Requested,
    /// Won a module version conflict.
    ConflictResolution,
    /// Forced by an edge or by the strategy.
    Forced,
    /// Rewritten by a dependency substitution rule.
    SelectedByRule,
    /// Selected through a module replacement.
    Replacement,
    /// Won a capability conflict.
    CapabilityConflict,
}

impl SelectionCause {
    /// Default human-readable description.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Requested => "requested",
            Self::ConflictResolution => "conflict resolution",
            Self::Forced => "forced",
            Self::SelectedByRule => "selected by rule",
            Self::Replacement => "replacement",
            Self::CapabilityConflict => "capability conflict",
        }
    }
}

/// A cause plus an optional custom description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionDescriptor {
    /// The cause.
    pub cause: SelectionCause,
    /// Overrides the default description, e.g. a `because` clause.
    pub description: Option<String>,
}

impl SelectionDescriptor {
    /// Creates a descriptor with the default description.
    #[must_use]
    pub const fn of(cause: SelectionCause) -> Self {
        Self {
            cause,
            description: None,
        }
    }

    /// Creates a descriptor with a custom description.
    #[must_use]
    pub fn described(cause: SelectionCause, description: impl Into<String>) -> Self {
        Self {
            cause,
            description: Some(description.into()),
        }
    }
}

impl fmt::Display for SelectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(d) => write!(f, "{}: {d}", self.cause.describe()),
            None => write!(f, "{}", self.cause.describe()),
        }
    }
}

/// The ordered, duplicate-free set of causes explaining a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReason {
    descriptors: Vec<SelectionDescriptor>,
}

impl SelectionReason {
    /// A reason with a single cause.
    #[must_use]
    pub fn of(cause: SelectionCause) -> Self {
        let mut reason = Self::default();
        reason.add(SelectionDescriptor::of(cause));
        reason
    }

    /// Adds a descriptor unless an equal one is present.
    pub fn add(&mut self, descriptor: SelectionDescriptor) {
        if !self.descriptors.contains(&descriptor) {
            self.descriptors.push(descriptor);
        }
    }

    /// Adds every descriptor of `other`.
    pub fn merge(&mut self, other: &Self) {
        for descriptor in &other.descriptors {
            self.add(descriptor.clone());
        }
    }

    /// Whether `cause` contributed to the selection.
    #[must_use]
    pub fn contains(&self, cause: SelectionCause) -> bool {
        self.descriptors.iter().any(|d| d.cause == cause)
    }

    /// Whether the selection resulted from a version conflict.
    #[must_use]
    pub fn is_conflict_resolution(&self) -> bool {
        self.contains(SelectionCause::ConflictResolution)
    }

    /// The contributing descriptors, in the order they were added.
    #[must_use]
    pub fn descriptors(&self) -> &[SelectionDescriptor] {
        &self.descriptors
    }
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.descriptors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl Serialize for SelectionReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.descriptors.iter().map(ToString::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_ignored() {
        let mut reason = SelectionReason::of(SelectionCause::Requested);
        reason.add(SelectionDescriptor::of(SelectionCause::Requested));
        reason.add(SelectionDescriptor::of(SelectionCause::ConflictResolution));
        assert_eq!(reason.descriptors().len(), 2);
        assert!(reason.is_conflict_resolution());
        assert_eq!(reason.to_string(), "requested, conflict resolution");
    }

    #[test]
    fn custom_description_is_rendered() {
        let mut reason = SelectionReason::default();
        reason.add(SelectionDescriptor::described(
            SelectionCause::SelectedByRule,
            "migrated to project",
        ));
        assert_eq!(reason.to_string(), "selected by rule: migrated to project");
        let json = serde_json::to_string(&reason).expect("serialize");
        assert_eq!(json, r#"["selected by rule: migrated to project"]"#);
    }
}
