//! Resolution sessions over one build.
//!
//! A session owns the build-tree state shared by every resolution of the
//! build: the component state registry, the module repository, and the
//! live configurations of each project. Resolutions borrow the session
//! immutably, so several of them may run in parallel and share component
//! and variant states.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use graft_common::attributes::Attributes;
use graft_common::error::{GraftError, Result};
use graft_common::types::{ComponentId, ModuleVersionId};
use graft_engine::context::ResolveContext;
use graft_engine::graph::{BuildOperationVisitor, DependencyGraphBuilder, DependencyGraphVisitor, ResolvedGraph};
use graft_engine::resolver::{
    ComponentResolver, ComponentResolversChain, LocalProject, ModuleComponentResolver,
    ProjectComponentResolver, ResolverProviderFactory,
};
use graft_engine::strategy::ResolutionStrategy;
use graft_model::configuration::{ConfigurationDefinition, ConfigurationsProvider};
use graft_model::dependency::DependencyMetadata;
use graft_model::registry::ComponentStateRegistry;
use graft_model::repository::{ExternalModuleMetadata, InMemoryRepository, ModuleRepository};
use graft_model::state::{ComponentGraphResolveState, SelectableVariantResult};
use graft_model::verifier::VariantIdentityReport;
use rayon::prelude::*;

use crate::description::BuildDescription;

const DETACHED_CONFIGURATION: &str = "detachedConfiguration";
const DETACHED_GROUP: &str = "graft.detached";

/// Resolves the configurations of one build.
#[derive(Debug)]
pub struct ResolutionSession {
    build: String,
    registry: Arc<ComponentStateRegistry>,
    repository: Arc<InMemoryRepository>,
    projects: Vec<LocalProject>,
    strategy: ResolutionStrategy,
    factories: Vec<Arc<dyn ResolverProviderFactory>>,
    detached: AtomicU64,
}

impl ResolutionSession {
    /// Creates an empty session for `build`.
    #[must_use]
    pub fn new(build: impl Into<String>, strategy: ResolutionStrategy) -> Self {
        Self {
            build: build.into(),
            registry: Arc::new(ComponentStateRegistry::new()),
            repository: Arc::new(InMemoryRepository::new()),
            projects: Vec::new(),
            strategy,
            factories: Vec::new(),
            detached: AtomicU64::new(0),
        }
    }

    /// Creates a session holding every project and module of `description`.
    ///
    /// # Errors
    ///
    /// Returns an error if a notation in the description cannot be parsed.
    pub fn from_description(description: &BuildDescription) -> Result<Self> {
        let strategy = ResolutionStrategy::from_config(&description.resolution)?;
        let mut session = Self::new(description.build.clone(), strategy);
        for project in &description.projects {
            let _ = session.add_project(
                project.path.clone(),
                description.coordinates_of(project),
                project.configuration_definitions()?,
            );
        }
        for module in &description.modules {
            session.publish(module.to_metadata()?);
        }
        tracing::info!(
            build = %session.build,
            projects = session.projects.len(),
            modules = session.repository.len(),
            "resolution session ready"
        );
        Ok(session)
    }

    /// Adds a project, replacing any project with the same path.
    ///
    /// Returns the live configuration container of the project.
    pub fn add_project(
        &mut self,
        path: impl Into<String>,
        module_version_id: ModuleVersionId,
        configurations: Vec<ConfigurationDefinition>,
    ) -> Arc<ConfigurationsProvider> {
        let path = path.into();
        let provider = Arc::new(ConfigurationsProvider::with_configurations(configurations));
        if self.project(&path).is_some() {
            self.projects.retain(|p| p.path != path);
            let _ = self.registry.remove(&self.project_id(&path));
            tracing::debug!(path = %path, "replacing project");
        }
        tracing::debug!(path = %path, id = %module_version_id, "adding project");
        self.projects.push(LocalProject {
            path,
            module_version_id,
            configurations: Arc::clone(&provider),
        });
        provider
    }

    /// Publishes an external module version to the session repository.
    pub fn publish(&self, metadata: ExternalModuleMetadata) {
        self.repository.publish(metadata);
    }

    /// Registers a factory contributing custom resolvers.
    pub fn register_resolver_factory(&mut self, factory: Arc<dyn ResolverProviderFactory>) {
        self.factories.push(factory);
    }

    /// Replaces the strategy used by later resolutions.
    pub fn set_strategy(&mut self, strategy: ResolutionStrategy) {
        self.strategy = strategy;
    }

    /// Returns the session with another strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The strategy in effect.
    #[must_use]
    pub const fn strategy(&self) -> &ResolutionStrategy {
        &self.strategy
    }

    /// The shared component state registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ComponentStateRegistry> {
        &self.registry
    }

    /// Paths of the projects, in insertion order.
    #[must_use]
    pub fn project_paths(&self) -> Vec<&str> {
        self.projects.iter().map(|p| p.path.as_str()).collect()
    }

    /// Component id of the project at `path`.
    #[must_use]
    pub fn project_id(&self, path: &str) -> ComponentId {
        ComponentId::project(self.build.clone(), path)
    }

    /// Live configurations of the project at `path`.
    #[must_use]
    pub fn configurations(&self, path: &str) -> Option<Arc<ConfigurationsProvider>> {
        self.project(path).map(|p| Arc::clone(&p.configurations))
    }

    /// Resolve state of the project at `path`, created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::ComponentNotFound`] if no project has that path.
    pub fn component_state(&self, path: &str) -> Result<Arc<ComponentGraphResolveState>> {
        let project = self.project(path).ok_or_else(|| GraftError::ComponentNotFound {
            selector: format!("project {path}"),
        })?;
        Ok(self.registry.state_for(
            &self.project_id(path),
            &project.module_version_id,
            &project.configurations,
        ))
    }

    /// Resolves configuration `configuration` of the project at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project or configuration is unknown, or the
    /// graph cannot be resolved.
    pub fn resolve(&self, path: &str, configuration: &str) -> Result<ResolvedGraph> {
        self.resolve_with(path, configuration, &mut BuildOperationVisitor::new())
    }

    /// Resolves a configuration, reporting the graph to `visitor`.
    ///
    /// The visitor also sees the partial graph of a failed resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if the project or configuration is unknown, or the
    /// graph cannot be resolved.
    pub fn resolve_with(
        &self,
        path: &str,
        configuration: &str,
        visitor: &mut dyn DependencyGraphVisitor,
    ) -> Result<ResolvedGraph> {
        let root = self.component_state(path)?;
        self.resolve_root(&root, configuration, visitor)
    }

    /// Resolves several `(project path, configuration)` requests in parallel.
    ///
    /// Results are returned in request order.
    #[must_use]
    pub fn resolve_all(&self, requests: &[(String, String)]) -> Vec<Result<ResolvedGraph>> {
        tracing::info!(requests = requests.len(), "resolving configurations in parallel");
        requests
            .par_iter()
            .map(|(path, configuration)| self.resolve(path, configuration))
            .collect()
    }

    /// Resolves an ad hoc configuration holding `dependencies`.
    ///
    /// Each call creates a fresh root component that is never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph cannot be resolved.
    pub fn resolve_detached(
        &self,
        dependencies: Vec<DependencyMetadata>,
        attributes: Attributes,
    ) -> Result<ResolvedGraph> {
        let index = self.detached.fetch_add(1, Ordering::Relaxed) + 1;
        let name = format!("{DETACHED_CONFIGURATION}{index}");
        let configuration = ConfigurationDefinition {
            attributes,
            dependencies,
            ..ConfigurationDefinition::resolvable(name.clone())
        };
        let root = self.registry.ad_hoc_state_for(
            self.project_id(&format!(":{name}")),
            ModuleVersionId::new(DETACHED_GROUP, name.clone(), "unspecified"),
            Arc::new(ConfigurationsProvider::with_configurations(vec![configuration])),
        );
        self.resolve_root(&root, &name, &mut BuildOperationVisitor::new())
    }

    /// Selectable variants of the project at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is unknown or its consumable variants
    /// are ambiguous.
    pub fn variants(&self, path: &str) -> Result<Arc<Vec<SelectableVariantResult>>> {
        self.component_state(path)?.selectable_variant_results()
    }

    /// Discards the cached variants of the project at `path`.
    ///
    /// Resolutions already in flight keep the variants they captured.
    /// Returns whether the project had a cached state.
    pub fn reevaluate(&self, path: &str) -> bool {
        self.registry.reevaluate(&self.project_id(path))
    }

    /// Mutates configuration `name` of the project at `path`, then
    /// reevaluates the project.
    ///
    /// Returns whether the configuration exists.
    pub fn update_configuration(
        &self,
        path: &str,
        name: &str,
        mutate: impl FnOnce(&mut ConfigurationDefinition),
    ) -> bool {
        let Some(project) = self.project(path) else {
            return false;
        };
        if !project.configurations.update(name, mutate) {
            return false;
        }
        let _ = self.reevaluate(path);
        true
    }

    /// Identity reports of every project with indistinguishable variants.
    #[must_use]
    pub fn identity_conflicts(&self) -> Vec<(String, VariantIdentityReport)> {
        self.projects
            .iter()
            .filter_map(|project| {
                let report = VariantIdentityReport::build(
                    &self.project_id(&project.path),
                    &project.configurations.snapshot(),
                );
                (!report.conflicts().is_empty()).then(|| (project.path.clone(), report))
            })
            .collect()
    }

    /// Fails if any project exposes indistinguishable consumable variants.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::AmbiguousVariantIdentity`] for the first
    /// conflicting project.
    pub fn check(&self) -> Result<()> {
        self.identity_conflicts()
            .iter()
            .try_for_each(|(_, report)| report.assert_no_conflicts())
    }

    fn project(&self, path: &str) -> Option<&LocalProject> {
        self.projects.iter().find(|p| p.path == path)
    }

    fn resolve_root(
        &self,
        root: &Arc<ComponentGraphResolveState>,
        variant: &str,
        visitor: &mut dyn DependencyGraphVisitor,
    ) -> Result<ResolvedGraph> {
        let context = ResolveContext::new(root.id(), variant, &self.strategy);
        let chain = ComponentResolversChain::build(&self.factories, &context, self.default_resolvers());
        tracing::debug!(root = %root.id(), resolvers = ?chain.names(), "resolving");
        DependencyGraphBuilder::new(&self.strategy, &chain).resolve(root, variant, visitor)
    }

    fn default_resolvers(&self) -> Vec<Arc<dyn ComponentResolver>> {
        let repository: Arc<dyn ModuleRepository> = self.repository.clone();
        vec![
            Arc::new(ProjectComponentResolver::new(
                self.build.clone(),
                self.projects.clone(),
                Arc::clone(&self.registry),
            )),
            Arc::new(ModuleComponentResolver::new(repository, Arc::clone(&self.registry))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use graft_common::config::ConflictResolution;
    use graft_common::constants::ROOT_BUILD_NAME;
    use graft_common::selector::VersionConstraint;
    use graft_common::types::{ComponentSelector, ModuleId};
    use graft_model::artifact::ArtifactMetadata;
    use graft_model::variant::VariantMetadata;

    use super::*;

    fn module(group: &str, name: &str, version: &str) -> DependencyMetadata {
        DependencyMetadata::new(ComponentSelector::module(
            ModuleId::new(group, name),
            version.parse::<VersionConstraint>().expect("constraint"),
        ))
    }

    fn session() -> ResolutionSession {
        let mut session =
            ResolutionSession::new(ROOT_BUILD_NAME, ResolutionStrategy::new(ConflictResolution::Latest));
        let _ = session.add_project(
            ":app",
            ModuleVersionId::new("test", "app", "1.0"),
            vec![
                ConfigurationDefinition::resolvable("runtimeClasspath")
                    .with_attribute("usage", "runtime")
                    .with_dependency(DependencyMetadata::new(ComponentSelector::project(":lib")))
                    .with_dependency(module("org", "core", "1.0")),
            ],
        );
        let _ = session.add_project(
            ":lib",
            ModuleVersionId::new("test", "lib", "1.0"),
            vec![
                ConfigurationDefinition::consumable("runtimeElements")
                    .with_attribute("usage", "runtime")
                    .with_artifact(ArtifactMetadata::new("lib"))
                    .with_dependency(module("org", "core", "2.0")),
            ],
        );
        for version in ["1.0", "2.0"] {
            session.publish(
                ExternalModuleMetadata::new(ModuleVersionId::new("org", "core", version)).with_variant(
                    VariantMetadata::new("runtime").with_attribute("usage", "runtime"),
                ),
            );
        }
        session
    }

    #[test]
    fn resolves_a_project_configuration() {
        let graph = session().resolve(":app", "runtimeClasspath").expect("resolve");
        let core = graph.nodes_of_module(&ModuleId::new("org", "core"));
        assert_eq!(core.len(), 1);
        assert_eq!(core[0].module_version.version(), "2.0");
        assert_eq!(graph.nodes().len(), 3);
    }

    #[test]
    fn unknown_project_is_reported() {
        let err = session().resolve(":missing", "runtimeClasspath").expect_err("unknown");
        assert!(matches!(err, GraftError::ComponentNotFound { .. }));
    }

    #[test]
    fn detached_resolutions_use_fresh_roots() {
        let session = session();
        let first = session
            .resolve_detached(vec![module("org", "core", "1.0")], Attributes::empty().with("usage", "runtime"))
            .expect("first");
        let second = session
            .resolve_detached(vec![module("org", "core", "1.0")], Attributes::empty().with("usage", "runtime"))
            .expect("second");
        let first_root = first.root().expect("root").component.clone();
        let second_root = second.root().expect("root").component.clone();
        assert_ne!(first_root, second_root);
        assert!(session.registry().get(&first_root).is_none());
        assert_eq!(first.nodes().len(), 2);
    }

    #[test]
    fn update_configuration_reevaluates_the_project() {
        let session = session();
        let before = session.variants(":lib").expect("variants");
        assert!(session.update_configuration(":lib", "runtimeElements", |c| {
            c.attributes = c.attributes.clone().with("flavor", "fast");
        }));
        let after = session.variants(":lib").expect("variants");
        assert_ne!(before[0].instance_id, after[0].instance_id);
        assert_eq!(after[0].attributes.get("flavor"), Some("fast"));
        assert!(!session.update_configuration(":lib", "missing", |_| {}));
    }

    #[test]
    fn re_adding_a_project_drops_its_cached_state() {
        let mut session = session();
        let names = |s: &ResolutionSession| -> Vec<String> {
            s.variants(":lib").expect("variants").iter().map(|v| v.name.clone()).collect()
        };
        assert_eq!(names(&session), vec!["runtimeElements"]);

        let _ = session.add_project(
            ":lib",
            ModuleVersionId::new("test", "lib", "1.0"),
            vec![ConfigurationDefinition::consumable("replacedElements").with_attribute("usage", "runtime")],
        );

        assert_eq!(names(&session), vec!["replacedElements"]);
        assert_eq!(session.project_paths().len(), 2);
        let graph = session.resolve(":app", "runtimeClasspath").expect("resolve");
        let lib = graph.nodes_of_module(&ModuleId::new("test", "lib"));
        assert_eq!(lib[0].variant, "replacedElements");
    }

    #[test]
    fn check_reports_indistinguishable_variants() {
        let mut session = session();
        assert!(session.check().is_ok());
        let _ = session.add_project(
            ":twin",
            ModuleVersionId::new("test", "twin", "1.0"),
            vec![
                ConfigurationDefinition::consumable("a").with_attribute("usage", "runtime"),
                ConfigurationDefinition::consumable("b").with_attribute("usage", "runtime"),
            ],
        );
        let conflicts = session.identity_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].0, ":twin");
        assert!(matches!(session.check(), Err(GraftError::AmbiguousVariantIdentity { .. })));
    }
}
