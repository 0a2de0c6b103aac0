//! Eager uniqueness checks over the consumable variants of a component.
//!
//! Two consumable variants are indistinguishable to a consumer when they
//! share a name, or when they expose the same attributes and the same
//! capabilities. Such components are rejected before any graph traversal
//! touches them, never halfway through attribute matching.

use std::collections::{BTreeSet, HashMap};

use graft_common::error::{GraftError, Result};
use graft_common::types::ComponentId;

use crate::configuration::ConfigurationDefinition;

/// One pair of consumable variants with the same identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConflict {
    /// Variant declared first.
    pub first: String,
    /// Variant declared later.
    pub second: String,
    /// Description of the shared identity.
    pub identity: String,
}

/// Result of verifying one component's consumable variants.
#[derive(Debug, Clone)]
pub struct VariantIdentityReport {
    component: String,
    conflicts: Vec<IdentityConflict>,
}

impl VariantIdentityReport {
    /// Checks the consumable configurations of `component`.
    #[must_use]
    pub fn build(component: &ComponentId, configurations: &[ConfigurationDefinition]) -> Self {
        let consumable: Vec<&ConfigurationDefinition> =
            configurations.iter().filter(|c| c.can_be_consumed).collect();

        let mut conflicts = Vec::new();
        check_duplicate_names(&consumable, &mut conflicts);
        check_duplicate_identities(&consumable, &mut conflicts);

        Self {
            component: component.display_name(),
            conflicts,
        }
    }

    /// Returns the detected conflicts.
    #[must_use]
    pub fn conflicts(&self) -> &[IdentityConflict] {
        &self.conflicts
    }

    /// Fails with the first detected conflict.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::AmbiguousVariantIdentity`] if any conflict exists.
    pub fn assert_no_conflicts(&self) -> Result<()> {
        match self.conflicts.first() {
            Some(conflict) => Err(GraftError::AmbiguousVariantIdentity {
                component: self.component.clone(),
                first: conflict.first.clone(),
                second: conflict.second.clone(),
                identity: conflict.identity.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn check_duplicate_names(
    consumable: &[&ConfigurationDefinition],
    conflicts: &mut Vec<IdentityConflict>,
) {
    let mut seen: HashMap<&str, &ConfigurationDefinition> = HashMap::new();
    for configuration in consumable {
        if let Some(previous) = seen.insert(configuration.name.as_str(), configuration) {
            conflicts.push(IdentityConflict {
                first: previous.name.clone(),
                second: configuration.name.clone(),
                identity: format!(
                    "name '{}' with capabilities {}",
                    configuration.name,
                    describe_capabilities(configuration)
                ),
            });
        }
    }
}

fn check_duplicate_identities(
    consumable: &[&ConfigurationDefinition],
    conflicts: &mut Vec<IdentityConflict>,
) {
    let mut seen: HashMap<(String, BTreeSet<String>), &str> = HashMap::new();
    for configuration in consumable.iter().filter(|c| !c.attributes.is_empty()) {
        let capabilities = configuration
            .capabilities
            .iter()
            .map(ToString::to_string)
            .collect();
        let key = (configuration.attributes.to_string(), capabilities);
        if let Some(previous) = seen.get(&key) {
            if *previous != configuration.name {
                conflicts.push(IdentityConflict {
                    first: (*previous).to_string(),
                    second: configuration.name.clone(),
                    identity: format!(
                        "attributes {} with capabilities {}",
                        configuration.attributes,
                        describe_capabilities(configuration)
                    ),
                });
            }
        } else {
            let _ = seen.insert(key, configuration.name.as_str());
        }
    }
}

fn describe_capabilities(configuration: &ConfigurationDefinition) -> String {
    if configuration.capabilities.is_empty() {
        return "[implicit]".to_string();
    }
    let names: Vec<String> = configuration
        .capabilities
        .iter()
        .map(ToString::to_string)
        .collect();
    format!("[{}]", names.join(", "))
}
