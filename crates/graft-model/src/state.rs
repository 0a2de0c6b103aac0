//! Long-lived, thread-safe resolve state of components and their variants.
//!
//! A [`ComponentGraphResolveState`] is created once per component for the
//! whole build tree and shared by every resolution that reaches it, possibly
//! from several threads at once. All memoized data is published as complete
//! `Arc`s; [`reevaluate`](ComponentGraphResolveState::reevaluate) drops the
//! published values so the next reader rebuilds them, while holders of the
//! previous values keep a consistent snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use graft_common::attributes::Attributes;
use graft_common::capability::Capability;
use graft_common::error::Result;
use graft_common::types::{ComponentId, ModuleVersionId};
use serde::Serialize;
use tracing::{debug, trace};

use crate::artifact::{ArtifactMetadata, ArtifactTransformer};
use crate::candidates::GraphSelectionCandidates;
use crate::factory::{ConfigurationFlags, VariantMetadataFactory};
use crate::ids::IdGenerator;
use crate::lazy::{AtomicLazy, LockingLazy};
use crate::variant::VariantMetadata;

/// Artifacts of one variant, after any identity-shifting transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifactSet {
    /// Owning variant name.
    pub variant: String,
    /// Resolved artifacts.
    pub artifacts: Vec<ArtifactMetadata>,
}

/// Resolve state of one variant of one component.
#[derive(Debug)]
pub struct VariantGraphResolveState {
    instance_id: u64,
    component_id: ComponentId,
    metadata: Arc<VariantMetadata>,
    transformer: Option<Arc<ArtifactTransformer>>,
    artifacts: AtomicLazy<ResolvedArtifactSet>,
}

impl VariantGraphResolveState {
    /// Wraps variant metadata.
    #[must_use]
    pub const fn new(
        instance_id: u64,
        component_id: ComponentId,
        metadata: Arc<VariantMetadata>,
        transformer: Option<Arc<ArtifactTransformer>>,
    ) -> Self {
        Self {
            instance_id,
            component_id,
            metadata,
            transformer,
            artifacts: AtomicLazy::new(),
        }
    }

    /// Build-tree-unique id of this variant state.
    #[must_use]
    pub const fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Owning component.
    #[must_use]
    pub const fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    /// Variant name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    /// Underlying metadata.
    #[must_use]
    pub fn metadata(&self) -> &Arc<VariantMetadata> {
        &self.metadata
    }

    /// Returns the artifacts of this variant, computing them once.
    ///
    /// Computation may run concurrently on racing threads; one result is kept.
    pub fn resolve_artifacts(&self) -> Arc<ResolvedArtifactSet> {
        self.artifacts.get_or_init(|| ResolvedArtifactSet {
            variant: self.metadata.name().to_string(),
            artifacts: match &self.transformer {
                Some(transformer) => self
                    .metadata
                    .artifacts()
                    .iter()
                    .map(|a| transformer.apply(a))
                    .collect(),
                None => self.metadata.artifacts().to_vec(),
            },
        })
    }
}

/// Public view of one selectable variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectableVariantResult {
    /// Variant state id.
    pub instance_id: u64,
    /// Variant name.
    pub name: String,
    /// Variant attributes.
    pub attributes: Attributes,
    /// Declared capabilities; empty means the implicit one.
    pub capabilities: Vec<Capability>,
}

/// Long-lived resolve state of one component.
///
/// Lock ordering: a thread may hold the candidates lock while the factory
/// takes the configurations lock and then the dependency cache lock, never
/// the reverse. The root variant map never holds a shard lock while a
/// variant is built.
#[derive(Debug)]
pub struct ComponentGraphResolveState {
    instance_id: u64,
    id: ComponentId,
    module_version_id: ModuleVersionId,
    status: String,
    ad_hoc: bool,
    factory: Arc<VariantMetadataFactory>,
    transformer: Option<Arc<ArtifactTransformer>>,
    ids: Arc<IdGenerator>,
    generation: AtomicU64,
    root_variants: DashMap<String, Arc<VariantGraphResolveState>>,
    candidates: LockingLazy<GraphSelectionCandidates>,
    selectable: LockingLazy<Vec<SelectableVariantResult>>,
}

impl ComponentGraphResolveState {
    /// Creates the state of a component backed by `factory`.
    #[must_use]
    pub fn new(
        id: ComponentId,
        module_version_id: ModuleVersionId,
        status: impl Into<String>,
        factory: Arc<VariantMetadataFactory>,
        ids: Arc<IdGenerator>,
    ) -> Self {
        Self {
            instance_id: ids.next_component_id(),
            id,
            module_version_id,
            status: status.into(),
            ad_hoc: false,
            factory,
            transformer: None,
            ids,
            generation: AtomicU64::new(0),
            root_variants: DashMap::new(),
            candidates: LockingLazy::new(),
            selectable: LockingLazy::new(),
        }
    }

    /// Marks the state as belonging to a detached, ad hoc component.
    #[must_use]
    pub fn into_ad_hoc(mut self) -> Self {
        self.ad_hoc = true;
        self
    }

    /// Build-tree-unique id of this state.
    #[must_use]
    pub const fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Component identifier.
    #[must_use]
    pub const fn id(&self) -> &ComponentId {
        &self.id
    }

    /// Module coordinates of the component.
    #[must_use]
    pub const fn module_version_id(&self) -> &ModuleVersionId {
        &self.module_version_id
    }

    /// Status, e.g. `release` or `integration`.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether the component was created for a detached configuration.
    #[must_use]
    pub const fn is_ad_hoc(&self) -> bool {
        self.ad_hoc
    }

    /// Number of times this state was reevaluated.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns the root variant named `name`.
    ///
    /// Repeated lookups return the same state until the next reevaluation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationNotFound`](graft_common::error::GraftError::ConfigurationNotFound)
    /// if the configuration does not exist or is not resolvable.
    pub fn root_variant(&self, name: &str) -> Result<Arc<VariantGraphResolveState>> {
        if let Some(existing) = self.root_variants.get(name) {
            return Ok(Arc::clone(existing.value()));
        }
        let generation = self.generation();
        let metadata = self.factory.root_variant(&self.id, name)?;
        let created = Arc::new(self.variant_state(metadata));
        Ok(self.publish_root_variant(name, generation, created))
    }

    /// Memoizes `created` unless the state was reevaluated after `generation`
    /// was read, in which case it is returned without being published.
    fn publish_root_variant(
        &self,
        name: &str,
        generation: u64,
        created: Arc<VariantGraphResolveState>,
    ) -> Arc<VariantGraphResolveState> {
        let entry = self.root_variants.entry(name.to_string());
        if self.generation() != generation {
            trace!(component = %self.id, variant = name, "root variant outdated by reevaluation");
            return created;
        }
        Arc::clone(entry.or_insert(created).value())
    }

    /// Returns the candidates for graph variant selection, building them once
    /// per generation.
    ///
    /// # Errors
    ///
    /// Returns [`AmbiguousVariantIdentity`](graft_common::error::GraftError::AmbiguousVariantIdentity)
    /// if two consumable variants are indistinguishable.
    pub fn candidates_for_graph_variant_selection(&self) -> Result<Arc<GraphSelectionCandidates>> {
        self.candidates.get_or_try_init(|| {
            let generation = self.generation();
            let mut variants = Vec::new();
            self.factory.visit_consumable_variants(&self.id, |metadata| {
                variants.push(Arc::new(self.variant_state(metadata)));
            })?;
            debug!(
                component = %self.id,
                generation,
                variants = variants.len(),
                "built graph selection candidates"
            );
            Ok(GraphSelectionCandidates::new(
                self.id.display_name(),
                generation,
                variants,
            ))
        })
    }

    /// Returns the roles of a configuration, if it exists.
    #[must_use]
    pub fn configuration_flags(&self, name: &str) -> Option<ConfigurationFlags> {
        self.factory.configuration_flags(name)
    }

    /// Names of every configuration of the component.
    #[must_use]
    pub fn configuration_names(&self) -> Vec<String> {
        self.factory.configuration_names()
    }

    /// Public view of all selectable variants.
    ///
    /// # Errors
    ///
    /// Fails like [`candidates_for_graph_variant_selection`](Self::candidates_for_graph_variant_selection).
    pub fn selectable_variant_results(&self) -> Result<Arc<Vec<SelectableVariantResult>>> {
        self.selectable.get_or_try_init(|| {
            let candidates = self.candidates_for_graph_variant_selection()?;
            Ok(candidates
                .all_variants()
                .iter()
                .map(|v| SelectableVariantResult {
                    instance_id: v.instance_id(),
                    name: v.name().to_string(),
                    attributes: v.metadata().attributes().clone(),
                    capabilities: v.metadata().capabilities().to_vec(),
                })
                .collect())
        })
    }

    /// Drops every memoized variant state and bumps the generation.
    ///
    /// The component identity is kept. Resolutions already holding a
    /// candidates snapshot keep using it.
    pub fn reevaluate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.root_variants.clear();
        let _ = self.candidates.reset();
        let _ = self.selectable.reset();
        self.factory.invalidate();
        debug!(component = %self.id, generation, "reevaluated component state");
    }

    /// Creates a state for the same underlying component under another
    /// identity, transforming its artifacts with `transform`.
    ///
    /// The copy shares the variant factory; its memoized state is its own.
    #[must_use]
    pub fn copy(
        &self,
        new_id: ComponentId,
        transform: impl Fn(&ArtifactMetadata) -> ArtifactMetadata + Send + Sync + 'static,
    ) -> Self {
        let transformer = match &self.transformer {
            Some(existing) => existing.then(transform),
            None => ArtifactTransformer::new(transform),
        };
        let module_version_id = match &new_id {
            ComponentId::Module(id) => id.clone(),
            ComponentId::Project { .. } => self.module_version_id.clone(),
        };
        debug!(from = %self.id, to = %new_id, "copied component state");
        Self {
            transformer: Some(Arc::new(transformer)),
            ad_hoc: self.ad_hoc,
            ..Self::new(
                new_id,
                module_version_id,
                self.status.clone(),
                Arc::clone(&self.factory),
                Arc::clone(&self.ids),
            )
        }
    }

    fn variant_state(&self, metadata: Arc<VariantMetadata>) -> VariantGraphResolveState {
        VariantGraphResolveState::new(
            self.ids.next_variant_id(),
            self.id.clone(),
            metadata,
            self.transformer.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use graft_common::error::GraftError;

    use super::*;
    use crate::configuration::{ConfigurationDefinition, ConfigurationsProvider};

    fn project_state(provider: &Arc<ConfigurationsProvider>) -> ComponentGraphResolveState {
        ComponentGraphResolveState::new(
            ComponentId::project(":", ":lib"),
            ModuleVersionId::new("test", "lib", "unspecified"),
            "integration",
            Arc::new(VariantMetadataFactory::configurations(Arc::clone(provider))),
            Arc::new(IdGenerator::new()),
        )
    }

    fn lib_provider() -> Arc<ConfigurationsProvider> {
        Arc::new(ConfigurationsProvider::with_configurations(vec![
            ConfigurationDefinition::consumable("apiElements")
                .with_attribute("usage", "api")
                .with_artifact(ArtifactMetadata::new("lib")),
            ConfigurationDefinition::resolvable("compileClasspath"),
        ]))
    }

    #[test]
    fn root_variant_lookup_is_idempotent() {
        let state = project_state(&lib_provider());
        let first = state.root_variant("compileClasspath").expect("root");
        let second = state.root_variant("compileClasspath").expect("root");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn reevaluate_exposes_new_configurations() {
        let provider = lib_provider();
        let state = project_state(&provider);
        assert!(matches!(
            state.root_variant("testClasspath"),
            Err(GraftError::ConfigurationNotFound { .. })
        ));

        provider.add(ConfigurationDefinition::resolvable("testClasspath"));
        state.reevaluate();
        assert!(state.root_variant("testClasspath").is_ok());
        assert_eq!(state.generation(), 1);
    }

    #[test]
    fn root_variant_built_before_reevaluation_is_not_memoized() {
        let provider = lib_provider();
        let state = project_state(&provider);
        let generation = state.generation();
        let metadata = state
            .factory
            .root_variant(state.id(), "compileClasspath")
            .expect("metadata");
        let outdated = Arc::new(state.variant_state(metadata));

        assert!(provider.update("compileClasspath", |c| {
            c.attributes = c.attributes.clone().with("flavor", "fast");
        }));
        state.reevaluate();
        let returned = state.publish_root_variant("compileClasspath", generation, Arc::clone(&outdated));
        assert!(Arc::ptr_eq(&returned, &outdated));

        let current = state.root_variant("compileClasspath").expect("root");
        assert!(!Arc::ptr_eq(&current, &outdated));
        assert_eq!(current.metadata().attributes().get("flavor"), Some("fast"));
        assert!(Arc::ptr_eq(&current, &state.root_variant("compileClasspath").expect("root")));
    }

    #[test]
    fn reevaluate_keeps_previous_candidate_snapshots_intact() {
        let provider = lib_provider();
        let state = project_state(&provider);
        let before = state
            .candidates_for_graph_variant_selection()
            .expect("candidates");

        provider.add(
            ConfigurationDefinition::consumable("runtimeElements").with_attribute("usage", "runtime"),
        );
        let cached = state
            .candidates_for_graph_variant_selection()
            .expect("candidates");
        assert!(Arc::ptr_eq(&before, &cached));

        state.reevaluate();
        let after = state
            .candidates_for_graph_variant_selection()
            .expect("candidates");
        assert_eq!(before.all_variants().len(), 1);
        assert_eq!(after.all_variants().len(), 2);
        assert_eq!(after.generation(), 1);
    }

    #[test]
    fn selectable_variants_describe_candidates() {
        let state = project_state(&lib_provider());
        let results = state.selectable_variant_results().expect("results");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "apiElements");
        assert_eq!(results[0].attributes.get("usage"), Some("api"));
    }

    #[test]
    fn copy_transforms_artifacts_once_and_keeps_original() {
        let state = project_state(&lib_provider());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let copy = state.copy(ComponentId::project("included", ":lib"), move |a| {
            let _ = counter.fetch_add(1, Ordering::SeqCst);
            a.clone().at(format!("/included/{}", a.file_name()))
        });
        assert_ne!(copy.instance_id(), state.instance_id());
        assert_eq!(copy.id().to_string(), "project :included:lib");

        let variant = copy
            .candidates_for_graph_variant_selection()
            .expect("candidates")
            .variant_by_configuration_name("apiElements")
            .expect("variant");
        let artifacts = variant.resolve_artifacts();
        let again = variant.resolve_artifacts();
        assert!(Arc::ptr_eq(&artifacts, &again));
        assert_eq!(artifacts.artifacts[0].path.as_deref(), Some("/included/lib.jar"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let original = state
            .candidates_for_graph_variant_selection()
            .expect("candidates")
            .variant_by_configuration_name("apiElements")
            .expect("variant")
            .resolve_artifacts();
        assert_eq!(original.artifacts[0].path, None);
    }

    #[test]
    fn concurrent_readers_share_one_candidate_snapshot() {
        let state = Arc::new(project_state(&lib_provider()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    state
                        .candidates_for_graph_variant_selection()
                        .expect("candidates")
                })
            })
            .collect();
        let snapshots: Vec<_> = handles.into_iter().map(|h| h.join().expect("join")).collect();
        assert!(snapshots.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
