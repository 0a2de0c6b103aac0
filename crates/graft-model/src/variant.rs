//! Variant metadata: the selectable facets of a component.

use graft_common::attributes::Attributes;
use graft_common::capability::Capability;
use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactMetadata, ArtifactTransformer};
use crate::dependency::DependencyMetadata;

/// Immutable metadata of one variant.
///
/// Local variants are backed by a configuration of the same name; the
/// configuration name is what dependencies use to select a variant
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantMetadata {
    name: String,
    #[serde(default)]
    configuration_name: Option<String>,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    capabilities: Vec<Capability>,
    #[serde(default)]
    artifacts: Vec<ArtifactMetadata>,
    #[serde(default)]
    dependencies: Vec<DependencyMetadata>,
    #[serde(default = "default_true")]
    can_be_consumed: bool,
    #[serde(default)]
    can_be_resolved: bool,
}

const fn default_true() -> bool {
    true
}

impl VariantMetadata {
    /// Creates a consumable, non-resolvable variant backed by the
    /// configuration of the same name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            configuration_name: Some(name.clone()),
            name,
            attributes: Attributes::empty(),
            capabilities: Vec::new(),
            artifacts: Vec::new(),
            dependencies: Vec::new(),
            can_be_consumed: true,
            can_be_resolved: false,
        }
    }

    /// Sets one attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes = self.attributes.with(key, value);
        self
    }

    /// Replaces all attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
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

    /// Replaces all dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<DependencyMetadata>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Sets whether the variant may be selected by other components.
    #[must_use]
    pub const fn consumable(mut self, value: bool) -> Self {
        self.can_be_consumed = value;
        self
    }

    /// Sets whether the variant may seed a resolution.
    #[must_use]
    pub const fn resolvable(mut self, value: bool) -> Self {
        self.can_be_resolved = value;
        self
    }

    /// Detaches the variant from any configuration.
    #[must_use]
    pub fn without_configuration(mut self) -> Self {
        self.configuration_name = None;
        self
    }

    /// Variant name, unique within its component.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the backing configuration, if any.
    #[must_use]
    pub fn configuration_name(&self) -> Option<&str> {
        self.configuration_name.as_deref()
    }

    /// Attributes used for attribute matching.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Declared capabilities; empty means the component's implicit capability.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Published artifacts.
    #[must_use]
    pub fn artifacts(&self) -> &[ArtifactMetadata] {
        &self.artifacts
    }

    /// Declared dependencies, including inherited ones.
    #[must_use]
    pub fn dependencies(&self) -> &[DependencyMetadata] {
        &self.dependencies
    }

    /// Whether the variant may be selected by other components.
    #[must_use]
    pub const fn is_consumable(&self) -> bool {
        self.can_be_consumed
    }

    /// Whether the variant may seed a resolution.
    #[must_use]
    pub const fn is_resolvable(&self) -> bool {
        self.can_be_resolved
    }

    /// Whether the variant participates in attribute matching.
    #[must_use]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Returns a copy whose artifacts went through `transformer`.
    #[must_use]
    pub fn copy_with_transformed_artifacts(&self, transformer: &ArtifactTransformer) -> Self {
        let mut copy = self.clone();
        copy.artifacts = self.artifacts.iter().map(|a| transformer.apply(a)).collect();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_variant_is_consumable_only() {
        let variant = VariantMetadata::new("apiElements");
        assert!(variant.is_consumable());
        assert!(!variant.is_resolvable());
        assert!(!variant.has_attributes());
        assert_eq!(variant.configuration_name(), Some("apiElements"));
    }

    #[test]
    fn copy_transforms_artifacts_only() {
        let variant = VariantMetadata::new("runtimeElements")
            .with_attribute("usage", "runtime")
            .with_artifact(ArtifactMetadata::new("lib"));
        let transformer = ArtifactTransformer::new(|a| a.clone().at("/included/lib.jar"));
        let copy = variant.copy_with_transformed_artifacts(&transformer);
        assert_eq!(copy.artifacts()[0].path.as_deref(), Some("/included/lib.jar"));
        assert_eq!(copy.attributes(), variant.attributes());
        assert_eq!(copy.name(), variant.name());
    }

    #[test]
    fn deserializes_with_defaults() {
        let variant: VariantMetadata =
            serde_json::from_str(r#"{"name":"default"}"#).expect("deserialize");
        assert!(variant.is_consumable());
        assert!(!variant.is_resolvable());
        assert_eq!(variant.configuration_name(), None);
    }
}
