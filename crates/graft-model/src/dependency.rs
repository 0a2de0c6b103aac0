//! Declared dependencies and exclusion rules.

use std::fmt;

use graft_common::attributes::Attributes;
use graft_common::capability::Capability;
use graft_common::types::{ComponentSelector, ModuleId};
use serde::{Deserialize, Serialize};

/// Excludes modules matching a group and/or a module name.
///
/// A rule with neither field set excludes everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExcludeRule {
    /// Group to exclude, or any group.
    #[serde(default)]
    pub group: Option<String>,
    /// Module name to exclude, or any module.
    #[serde(default)]
    pub module: Option<String>,
}

impl ExcludeRule {
    /// Excludes one module.
    #[must_use]
    pub fn module(id: &ModuleId) -> Self {
        Self {
            group: Some(id.group().to_string()),
            module: Some(id.name().to_string()),
        }
    }

    /// Excludes a whole group.
    #[must_use]
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            module: None,
        }
    }

    /// Returns whether the rule excludes `id`.
    #[must_use]
    pub fn matches(&self, id: &ModuleId) -> bool {
        self.group.as_deref().is_none_or(|g| g == id.group())
            && self.module.as_deref().is_none_or(|m| m == id.name())
    }
}

impl fmt::Display for ExcludeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.group.as_deref().unwrap_or("*"),
            self.module.as_deref().unwrap_or("*")
        )
    }
}

/// A dependency declared by a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyMetadata {
    /// What is requested.
    pub selector: ComponentSelector,
    /// Attributes requested in addition to the consumer's.
    #[serde(default)]
    pub attributes: Attributes,
    /// Capabilities the selected variant must provide.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Explicit configuration to select, bypassing attribute matching.
    #[serde(default)]
    pub target_configuration: Option<String>,
    /// Modules excluded from this dependency's subgraph.
    #[serde(default)]
    pub excludes: Vec<ExcludeRule>,
    /// Whether this version wins every module conflict.
    #[serde(default)]
    pub force: bool,
    /// Whether strict versions of the target are honored by the whole graph.
    #[serde(default)]
    pub endorse_strict_versions: bool,
}

impl DependencyMetadata {
    /// Creates a plain dependency on `selector`.
    #[must_use]
    pub fn new(selector: ComponentSelector) -> Self {
        Self {
            selector,
            attributes: Attributes::empty(),
            capabilities: Vec::new(),
            target_configuration: None,
            excludes: Vec::new(),
            force: false,
            endorse_strict_versions: false,
        }
    }

    /// Requests additional attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Requires a capability on the selected variant.
    #[must_use]
    pub fn requiring(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Selects an explicit configuration.
    #[must_use]
    pub fn targeting(mut self, configuration: impl Into<String>) -> Self {
        self.target_configuration = Some(configuration.into());
        self
    }

    /// Adds an exclusion rule.
    #[must_use]
    pub fn excluding(mut self, rule: ExcludeRule) -> Self {
        self.excludes.push(rule);
        self
    }

    /// Forces the requested version.
    #[must_use]
    pub const fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Endorses the strict versions of the target.
    #[must_use]
    pub const fn endorsing_strict_versions(mut self) -> Self {
        self.endorse_strict_versions = true;
        self
    }
}

impl fmt::Display for DependencyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        if let Some(c) = &self.target_configuration {
            write!(f, " (configuration '{c}')")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_rule_wildcards() {
        let id = ModuleId::new("org.log", "core");
        assert!(ExcludeRule::group("org.log").matches(&id));
        assert!(ExcludeRule::module(&id).matches(&id));
        assert!(ExcludeRule::default().matches(&id));
        assert!(!ExcludeRule::group("org.other").matches(&id));
        assert_eq!(ExcludeRule::group("org.log").to_string(), "org.log:*");
    }

    #[test]
    fn builder_sets_flags() {
        let dep = DependencyMetadata::new(ComponentSelector::project(":lib"))
            .targeting("api")
            .forced()
            .endorsing_strict_versions();
        assert!(dep.force);
        assert!(dep.endorse_strict_versions);
        assert_eq!(dep.to_string(), "project :lib (configuration 'api')");
    }
}
