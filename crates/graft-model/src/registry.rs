//! Build-tree cache of component resolve states.
//!
//! Lock ordering, outermost first:
//!
//! 1. registry shard lock (held only to look up or publish a finished state)
//! 2. component candidates lock
//! 3. configurations provider lock
//! 4. dependency cache lock
//!
//! States are always constructed with no registry lock held, then published
//! with `entry().or_insert()`; a racing constructor's state is dropped.

use std::sync::Arc;

use dashmap::DashMap;
use graft_common::constants::DEFAULT_STATUS;
use graft_common::types::{ComponentId, ModuleVersionId};
use tracing::{debug, trace};

use crate::artifact::ArtifactMetadata;
use crate::configuration::ConfigurationsProvider;
use crate::factory::VariantMetadataFactory;
use crate::ids::IdGenerator;
use crate::repository::ExternalModuleMetadata;
use crate::state::ComponentGraphResolveState;
use crate::variant::VariantMetadata;

/// Creates and caches one [`ComponentGraphResolveState`] per component.
#[derive(Debug, Default)]
pub struct ComponentStateRegistry {
    states: DashMap<ComponentId, Arc<ComponentGraphResolveState>>,
    ids: Arc<IdGenerator>,
}

impl ComponentStateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state of a local project backed by live configurations.
    pub fn state_for(
        &self,
        id: &ComponentId,
        module_version_id: &ModuleVersionId,
        provider: &Arc<ConfigurationsProvider>,
    ) -> Arc<ComponentGraphResolveState> {
        self.get_or_create(id, || {
            ComponentGraphResolveState::new(
                id.clone(),
                module_version_id.clone(),
                DEFAULT_STATUS,
                Arc::new(VariantMetadataFactory::configurations(Arc::clone(provider))),
                Arc::clone(&self.ids),
            )
        })
    }

    /// Creates the state of a detached component. Ad hoc states are never cached.
    #[must_use]
    pub fn ad_hoc_state_for(
        &self,
        id: ComponentId,
        module_version_id: ModuleVersionId,
        provider: Arc<ConfigurationsProvider>,
    ) -> Arc<ComponentGraphResolveState> {
        Arc::new(
            ComponentGraphResolveState::new(
                id,
                module_version_id,
                DEFAULT_STATUS,
                Arc::new(VariantMetadataFactory::configurations(provider)),
                Arc::clone(&self.ids),
            )
            .into_ad_hoc(),
        )
    }

    /// Returns the state of a component restored from serialized variants.
    pub fn realized_state_for(
        &self,
        id: &ComponentId,
        module_version_id: &ModuleVersionId,
        variants: Vec<VariantMetadata>,
    ) -> Arc<ComponentGraphResolveState> {
        self.get_or_create(id, || {
            ComponentGraphResolveState::new(
                id.clone(),
                module_version_id.clone(),
                DEFAULT_STATUS,
                Arc::new(VariantMetadataFactory::realized(variants)),
                Arc::clone(&self.ids),
            )
        })
    }

    /// Returns the state of an external module version.
    pub fn external_state_for(
        &self,
        metadata: &ExternalModuleMetadata,
    ) -> Arc<ComponentGraphResolveState> {
        let id = ComponentId::Module(metadata.id.clone());
        self.get_or_create(&id, || {
            ComponentGraphResolveState::new(
                id.clone(),
                metadata.id.clone(),
                metadata.status.clone(),
                Arc::new(VariantMetadataFactory::realized(metadata.variants.clone())),
                Arc::clone(&self.ids),
            )
        })
    }

    /// Returns the state of `source` re-identified as `new_id`.
    pub fn copy_of(
        &self,
        source: &ComponentGraphResolveState,
        new_id: &ComponentId,
        transform: impl Fn(&ArtifactMetadata) -> ArtifactMetadata + Send + Sync + 'static,
    ) -> Arc<ComponentGraphResolveState> {
        self.get_or_create(new_id, || source.copy(new_id.clone(), transform))
    }

    /// Returns the cached state of `id`, if any.
    #[must_use]
    pub fn get(&self, id: &ComponentId) -> Option<Arc<ComponentGraphResolveState>> {
        self.states.get(id).map(|s| Arc::clone(s.value()))
    }

    /// Drops the cached state of `id`, returning it.
    ///
    /// Holders of the removed state keep using it; later lookups create a
    /// fresh one.
    pub fn remove(&self, id: &ComponentId) -> Option<Arc<ComponentGraphResolveState>> {
        let removed = self.states.remove(id).map(|(_, state)| state);
        if removed.is_some() {
            debug!(component = %id, "component state removed");
        }
        removed
    }

    /// Reevaluates the cached state of `id`, returning whether one existed.
    pub fn reevaluate(&self, id: &ComponentId) -> bool {
        match self.get(id) {
            Some(state) => {
                state.reevaluate();
                true
            }
            None => false,
        }
    }

    /// Reevaluates every cached state.
    pub fn reevaluate_all(&self) {
        let states: Vec<_> = self.states.iter().map(|s| Arc::clone(s.value())).collect();
        for state in states {
            state.reevaluate();
        }
    }

    /// Number of cached states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no state is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn get_or_create(
        &self,
        id: &ComponentId,
        create: impl FnOnce() -> ComponentGraphResolveState,
    ) -> Arc<ComponentGraphResolveState> {
        if let Some(existing) = self.get(id) {
            trace!(component = %id, "component state cache hit");
            return existing;
        }
        let created = Arc::new(create());
        debug!(component = %id, instance = created.instance_id(), "created component state");
        Arc::clone(self.states.entry(id.clone()).or_insert(created).value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ConfigurationDefinition;

    fn provider() -> Arc<ConfigurationsProvider> {
        Arc::new(ConfigurationsProvider::with_configurations(vec![
            ConfigurationDefinition::resolvable("compileClasspath"),
        ]))
    }

    fn lib() -> (ComponentId, ModuleVersionId) {
        (
            ComponentId::project(":", ":lib"),
            ModuleVersionId::new("test", "lib", "unspecified"),
        )
    }

    #[test]
    fn states_are_cached_per_component() {
        let registry = ComponentStateRegistry::new();
        let (id, mvid) = lib();
        let first = registry.state_for(&id, &mvid, &provider());
        let second = registry.state_for(&id, &mvid, &provider());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ad_hoc_states_are_not_cached() {
        let registry = ComponentStateRegistry::new();
        let (id, mvid) = lib();
        let state = registry.ad_hoc_state_for(id.clone(), mvid, provider());
        assert!(state.is_ad_hoc());
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn realized_state_serves_serialized_variants() {
        let registry = ComponentStateRegistry::new();
        let (id, mvid) = lib();
        let variants: Vec<VariantMetadata> = serde_json::from_str(
            r#"[{"name":"compileClasspath","configurationName":"compileClasspath","canBeConsumed":false,"canBeResolved":true}]"#,
        )
        .expect("deserialize");
        let state = registry.realized_state_for(&id, &mvid, variants);
        assert!(state.root_variant("compileClasspath").is_ok());
    }

    #[test]
    fn reevaluate_reaches_cached_state() {
        let registry = ComponentStateRegistry::new();
        let (id, mvid) = lib();
        let state = registry.state_for(&id, &mvid, &provider());
        assert!(registry.reevaluate(&id));
        assert_eq!(state.generation(), 1);
        assert!(!registry.reevaluate(&ComponentId::project(":", ":other")));
        registry.reevaluate_all();
        assert_eq!(state.generation(), 2);
    }

    #[test]
    fn removed_state_is_recreated_from_the_new_provider() {
        let registry = ComponentStateRegistry::new();
        let (id, mvid) = lib();
        let old = registry.state_for(&id, &mvid, &provider());
        let removed = registry.remove(&id).expect("cached");
        assert!(Arc::ptr_eq(&old, &removed));
        assert!(registry.remove(&id).is_none());

        let replacement = Arc::new(ConfigurationsProvider::with_configurations(vec![
            ConfigurationDefinition::resolvable("testClasspath"),
        ]));
        let fresh = registry.state_for(&id, &mvid, &replacement);
        assert!(!Arc::ptr_eq(&old, &fresh));
        assert!(fresh.root_variant("testClasspath").is_ok());
        assert!(fresh.root_variant("compileClasspath").is_err());
        assert!(old.root_variant("compileClasspath").is_ok());
    }

    #[test]
    fn copies_are_cached_under_the_new_identity() {
        let registry = ComponentStateRegistry::new();
        let (id, mvid) = lib();
        let source = registry.state_for(&id, &mvid, &provider());
        let target = ComponentId::project("included", ":lib");
        let copy = registry.copy_of(&source, &target, ArtifactMetadata::clone);
        assert_eq!(copy.id(), &target);
        assert!(Arc::ptr_eq(&copy, &registry.get(&target).expect("cached")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn parallel_lookups_publish_one_state() {
        let registry = Arc::new(ComponentStateRegistry::new());
        let provider = provider();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let provider = Arc::clone(&provider);
                std::thread::spawn(move || {
                    let (id, mvid) = lib();
                    registry.state_for(&id, &mvid, &provider)
                })
            })
            .collect();
        let states: Vec<_> = handles.into_iter().map(|h| h.join().expect("join")).collect();
        assert!(states.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
