//! Sources of variant metadata for a component.
//!
//! The set of sources is closed, so it is an enum rather than a trait:
//!
//! - [`VariantMetadataFactory::Realized`] serves precomputed variants, for
//!   components restored from serialized state or fetched from a repository.
//! - [`VariantMetadataFactory::Configurations`] builds variants on demand from
//!   live project configurations and memoizes dependency lists per
//!   configuration until invalidated.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use graft_common::error::{GraftError, Result};
use graft_common::types::ComponentId;
use parking_lot::Mutex;

use crate::configuration::{ConfigurationDefinition, ConfigurationsProvider};
use crate::dependency::DependencyMetadata;
use crate::variant::VariantMetadata;
use crate::verifier::VariantIdentityReport;

/// Roles of a configuration, used to explain selection failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationFlags {
    /// Whether other components may select it.
    pub consumable: bool,
    /// Whether it may seed a resolution.
    pub resolvable: bool,
}

/// Per-component cache of dependency lists, keyed by configuration name.
///
/// Entries include dependencies inherited through `extends_from`. The cache
/// never expires on its own; it is cleared by [`invalidate`](Self::invalidate),
/// which also starts a new epoch. A list computed during an earlier epoch is
/// returned to its caller but never cached.
#[derive(Debug, Default)]
pub struct DependencyCache {
    entries: Mutex<CacheEntries>,
}

#[derive(Debug, Default)]
struct CacheEntries {
    epoch: u64,
    lists: HashMap<String, Arc<Vec<DependencyMetadata>>>,
}

impl DependencyCache {
    /// Current epoch. Read it before taking the configurations snapshot that
    /// feeds [`dependencies_for`](Self::dependencies_for).
    pub fn epoch(&self) -> u64 {
        self.entries.lock().epoch
    }

    /// Returns the cached dependency list for `name`, computing it if absent.
    ///
    /// The computation runs outside the cache lock. Its result is cached only
    /// if no invalidation happened since `epoch`.
    pub fn dependencies_for(
        &self,
        epoch: u64,
        name: &str,
        compute: impl FnOnce() -> Vec<DependencyMetadata>,
    ) -> Arc<Vec<DependencyMetadata>> {
        {
            let entries = self.entries.lock();
            if let Some(cached) = entries.lists.get(name).filter(|_| entries.epoch == epoch) {
                return Arc::clone(cached);
            }
        }
        let computed = Arc::new(compute());
        let mut entries = self.entries.lock();
        if entries.epoch != epoch {
            return computed;
        }
        Arc::clone(entries.lists.entry(name.to_string()).or_insert(computed))
    }

    /// Drops every cached entry and starts a new epoch.
    pub fn invalidate(&self) {
        let mut entries = self.entries.lock();
        entries.epoch += 1;
        entries.lists.clear();
    }

    /// Number of cached configurations.
    pub fn len(&self) -> usize {
        self.entries.lock().lists.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().lists.is_empty()
    }
}

/// Precomputed variants, in declaration order.
#[derive(Debug)]
pub struct RealizedVariants {
    variants: Vec<Arc<VariantMetadata>>,
}

/// Variants derived lazily from a project's live configurations.
#[derive(Debug)]
pub struct ConfigurationVariants {
    provider: Arc<ConfigurationsProvider>,
    cache: DependencyCache,
}

/// A source of variant metadata for one component.
#[derive(Debug)]
pub enum VariantMetadataFactory {
    /// Eager, immutable variants.
    Realized(RealizedVariants),
    /// Lazy variants backed by live configuration state.
    Configurations(ConfigurationVariants),
}

impl VariantMetadataFactory {
    /// Creates a factory over precomputed variants.
    #[must_use]
    pub fn realized(variants: Vec<VariantMetadata>) -> Self {
        Self::Realized(RealizedVariants {
            variants: variants.into_iter().map(Arc::new).collect(),
        })
    }

    /// Creates a factory over live configurations.
    #[must_use]
    pub fn configurations(provider: Arc<ConfigurationsProvider>) -> Self {
        Self::Configurations(ConfigurationVariants {
            provider,
            cache: DependencyCache::default(),
        })
    }

    /// Visits every consumable variant, in declaration order.
    ///
    /// For live configurations the variant identities are verified first, so
    /// an ambiguous component fails before any variant is produced.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::AmbiguousVariantIdentity`] for ambiguous components.
    pub fn visit_consumable_variants(
        &self,
        component: &ComponentId,
        mut visitor: impl FnMut(Arc<VariantMetadata>),
    ) -> Result<()> {
        match self {
            Self::Realized(realized) => {
                realized
                    .variants
                    .iter()
                    .filter(|v| v.is_consumable())
                    .for_each(|v| visitor(Arc::clone(v)));
            }
            Self::Configurations(live) => {
                let epoch = live.cache.epoch();
                let snapshot = live.provider.snapshot();
                VariantIdentityReport::build(component, &snapshot).assert_no_conflicts()?;
                for configuration in snapshot.iter().filter(|c| c.can_be_consumed) {
                    visitor(Arc::new(live.create_variant(epoch, configuration, &snapshot)));
                }
            }
        }
        Ok(())
    }

    /// Returns the variant named `name` for use as a resolution root.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::ConfigurationNotFound`] if no such configuration
    /// exists or it is not resolvable.
    pub fn root_variant(&self, component: &ComponentId, name: &str) -> Result<Arc<VariantMetadata>> {
        let not_found = || GraftError::ConfigurationNotFound {
            name: name.to_string(),
            component: component.display_name(),
        };
        match self {
            Self::Realized(realized) => realized
                .variants
                .iter()
                .find(|v| v.configuration_name() == Some(name) && v.is_resolvable())
                .cloned()
                .ok_or_else(not_found),
            Self::Configurations(live) => {
                let epoch = live.cache.epoch();
                let snapshot = live.provider.snapshot();
                let configuration = snapshot
                    .iter()
                    .find(|c| c.name == name && c.can_be_resolved)
                    .ok_or_else(not_found)?;
                Ok(Arc::new(live.create_variant(epoch, configuration, &snapshot)))
            }
        }
    }

    /// Returns the roles of the configuration named `name`, if it exists.
    #[must_use]
    pub fn configuration_flags(&self, name: &str) -> Option<ConfigurationFlags> {
        match self {
            Self::Realized(realized) => realized
                .variants
                .iter()
                .find(|v| v.configuration_name() == Some(name))
                .map(|v| ConfigurationFlags {
                    consumable: v.is_consumable(),
                    resolvable: v.is_resolvable(),
                }),
            Self::Configurations(live) => {
                live.provider
                    .find_by_name(name)
                    .map(|c| ConfigurationFlags {
                        consumable: c.can_be_consumed,
                        resolvable: c.can_be_resolved,
                    })
            }
        }
    }

    /// Names of all configurations this factory can produce.
    #[must_use]
    pub fn configuration_names(&self) -> Vec<String> {
        match self {
            Self::Realized(realized) => realized
                .variants
                .iter()
                .filter_map(|v| v.configuration_name().map(ToString::to_string))
                .collect(),
            Self::Configurations(live) => live.provider.names(),
        }
    }

    /// Clears cached variant data. Component identity is unaffected.
    pub fn invalidate(&self) {
        if let Self::Configurations(live) = self {
            live.cache.invalidate();
        }
    }

    /// Returns the dependency cache of a live factory.
    #[must_use]
    pub const fn dependency_cache(&self) -> Option<&DependencyCache> {
        match self {
            Self::Realized(_) => None,
            Self::Configurations(live) => Some(&live.cache),
        }
    }
}

impl ConfigurationVariants {
    fn create_variant(
        &self,
        epoch: u64,
        configuration: &ConfigurationDefinition,
        all: &[ConfigurationDefinition],
    ) -> VariantMetadata {
        let dependencies = self.cache.dependencies_for(epoch, &configuration.name, || {
            collect_dependencies(configuration, all)
        });
        let mut variant = VariantMetadata::new(configuration.name.clone())
            .with_attributes(configuration.attributes.clone())
            .with_dependencies(dependencies.as_ref().clone())
            .consumable(configuration.can_be_consumed)
            .resolvable(configuration.can_be_resolved);
        for capability in &configuration.capabilities {
            variant = variant.with_capability(capability.clone());
        }
        for artifact in &configuration.artifacts {
            variant = variant.with_artifact(artifact.clone());
        }
        variant
    }
}

/// Collects own and inherited dependencies, depth first, without duplicates.
fn collect_dependencies(
    configuration: &ConfigurationDefinition,
    all: &[ConfigurationDefinition],
) -> Vec<DependencyMetadata> {
    let mut visited = HashSet::new();
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    let mut stack = vec![configuration];
    while let Some(current) = stack.pop() {
        if !visited.insert(current.name.as_str()) {
            continue;
        }
        for dependency in &current.dependencies {
            if seen.insert(dependency) {
                result.push(dependency.clone());
            }
        }
        for parent in current.extends_from.iter().rev() {
            if let Some(found) = all.iter().find(|c| &c.name == parent) {
                stack.push(found);
            }
        }
    }
    result
}
