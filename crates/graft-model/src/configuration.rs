//! Live configuration state of a local project.
//!
//! Configurations are mutable until the project finishes configuring, and
//! may be mutated again afterwards (which is what `reevaluate` exists for).
//! The provider is shared between the project model and the variant factory
//! that reads it.

use graft_common::attributes::Attributes;
use graft_common::capability::Capability;
use parking_lot::RwLock;

use crate::artifact::ArtifactMetadata;
use crate::dependency::DependencyMetadata;

/// A named configuration of a local project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationDefinition {
    /// Configuration name.
    pub name: String,
    /// Attributes exposed to consumers.
    pub attributes: Attributes,
    /// Declared capabilities.
    pub capabilities: Vec<Capability>,
    /// Published artifacts.
    pub artifacts: Vec<ArtifactMetadata>,
    /// Dependencies declared directly on this configuration.
    pub dependencies: Vec<DependencyMetadata>,
    /// Configurations whose dependencies this one inherits.
    pub extends_from: Vec<String>,
    /// Whether other components may select this configuration.
    pub can_be_consumed: bool,
    /// Whether this configuration may seed a resolution.
    pub can_be_resolved: bool,
}

impl ConfigurationDefinition {
    /// A consumable configuration (an outgoing variant).
    #[must_use]
    pub fn consumable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::empty(),
            capabilities: Vec::new(),
            artifacts: Vec::new(),
            dependencies: Vec::new(),
            extends_from: Vec::new(),
            can_be_consumed: true,
            can_be_resolved: false,
        }
    }

    /// A resolvable configuration (a classpath-like root).
    #[must_use]
    pub fn resolvable(name: impl Into<String>) -> Self {
        Self {
            can_be_consumed: false,
            can_be_resolved: true,
            ..Self::consumable(name)
        }
    }

    /// A configuration that only buckets dependencies for others to extend.
    #[must_use]
    pub fn bucket(name: impl Into<String>) -> Self {
        Self {
            can_be_consumed: false,
            can_be_resolved: false,
            ..Self::consumable(name)
        }
    }

    /// Sets one attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes = self.attributes.with(key, value);
        self
    }

    /// Declares a capability.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Publishes an artifact.
    #[must_use]
    pub fn with_artifact(mut self, artifact: ArtifactMetadata) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Declares a dependency.
    #[must_use]
    pub fn with_dependency(mut self, dependency: DependencyMetadata) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Inherits the dependencies of another configuration.
    #[must_use]
    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends_from.push(parent.into());
        self
    }
}

/// Thread-safe container of a project's configurations, in declaration order.
///
/// Names are expected to be unique but are not enforced here; duplicates
/// are reported by the variant identity verifier before traversal.
#[derive(Debug, Default)]
pub struct ConfigurationsProvider {
    configurations: RwLock<Vec<ConfigurationDefinition>>,
}

impl ConfigurationsProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider holding `configurations`.
    #[must_use]
    pub fn with_configurations(configurations: Vec<ConfigurationDefinition>) -> Self {
        Self {
            configurations: RwLock::new(configurations),
        }
    }

    /// Adds a configuration.
    pub fn add(&self, configuration: ConfigurationDefinition) {
        self.configurations.write().push(configuration);
    }

    /// Removes every configuration named `name`, returning whether any existed.
    pub fn remove(&self, name: &str) -> bool {
        let mut configurations = self.configurations.write();
        let before = configurations.len();
        configurations.retain(|c| c.name != name);
        configurations.len() != before
    }

    /// Mutates the first configuration named `name`, returning whether it existed.
    pub fn update(&self, name: &str, mutate: impl FnOnce(&mut ConfigurationDefinition)) -> bool {
        let mut configurations = self.configurations.write();
        match configurations.iter_mut().find(|c| c.name == name) {
            Some(configuration) => {
                mutate(configuration);
                true
            }
            None => false,
        }
    }

    /// Returns a copy of the first configuration named `name`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<ConfigurationDefinition> {
        self.configurations
            .read()
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    /// Returns a consistent copy of all configurations.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ConfigurationDefinition> {
        self.configurations.read().clone()
    }

    /// Names of all configurations, in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.configurations
            .read()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_roles() {
        let api = ConfigurationDefinition::consumable("apiElements");
        assert!(api.can_be_consumed && !api.can_be_resolved);
        let cp = ConfigurationDefinition::resolvable("compileClasspath");
        assert!(!cp.can_be_consumed && cp.can_be_resolved);
        let bucket = ConfigurationDefinition::bucket("implementation");
        assert!(!bucket.can_be_consumed && !bucket.can_be_resolved);
    }

    #[test]
    fn add_update_remove() {
        let provider = ConfigurationsProvider::new();
        provider.add(ConfigurationDefinition::consumable("apiElements"));
        provider.add(ConfigurationDefinition::resolvable("compileClasspath"));
        assert_eq!(provider.names(), vec!["apiElements", "compileClasspath"]);

        assert!(provider.update("apiElements", |c| c.can_be_consumed = false));
        assert!(!provider.find_by_name("apiElements").expect("present").can_be_consumed);
        assert!(!provider.update("missing", |_| {}));

        assert!(provider.remove("apiElements"));
        assert!(!provider.remove("apiElements"));
        assert_eq!(provider.names(), vec!["compileClasspath"]);
    }
}
