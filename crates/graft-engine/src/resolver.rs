//! Locating components for dependency selectors.
//!
//! A [`ComponentResolversChain`] asks its resolvers in order; each either
//! handles a request or passes (`Ok(None)`). Chains are assembled per
//! resolution from [`ResolverProviderFactory`]s: the first capable factory,
//! in priority order, contributes a resolver placed in front of the local
//! project resolver and the generic module resolver.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use graft_common::error::{GraftError, Result};
use graft_common::selector::VersionSelector;
use graft_common::types::{ComponentId, ComponentSelector, ModuleId, ModuleVersionId};
use graft_common::version::Version;
use graft_model::configuration::ConfigurationsProvider;
use graft_model::registry::ComponentStateRegistry;
use graft_model::repository::ModuleRepository;
use graft_model::state::ComponentGraphResolveState;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::context::ResolveContext;

/// Resolves selectors to components and components to their state.
pub trait ComponentResolver: Send + Sync + fmt::Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Maps `selector` to a concrete component, or passes with `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector is handled here but cannot be satisfied.
    fn resolve_selector(
        &self,
        selector: &ComponentSelector,
        context: &ResolveContext<'_>,
    ) -> Result<Option<ComponentId>>;

    /// Returns the state of `id`, or passes with `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the component is handled here but cannot be loaded.
    fn component_state(&self, id: &ComponentId) -> Result<Option<Arc<ComponentGraphResolveState>>>;
}

/// Creates resolvers for the resolutions it is able to serve.
pub trait ResolverProviderFactory: Send + Sync + fmt::Debug {
    /// Higher priorities are consulted first.
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this factory serves the resolution described by `context`.
    fn can_create(&self, context: &ResolveContext<'_>) -> bool;

    /// Creates the resolver for `context`.
    fn create(&self, context: &ResolveContext<'_>) -> Arc<dyn ComponentResolver>;
}

/// A project of the current build.
#[derive(Debug, Clone)]
pub struct LocalProject {
    /// Project path, e.g. `:lib`.
    pub path: String,
    /// Module coordinates the project publishes under.
    pub module_version_id: ModuleVersionId,
    /// Live configuration state.
    pub configurations: Arc<ConfigurationsProvider>,
}

/// Resolves project selectors against the projects of one build.
#[derive(Debug)]
pub struct ProjectComponentResolver {
    build: String,
    projects: HashMap<String, LocalProject>,
    registry: Arc<ComponentStateRegistry>,
}

impl ProjectComponentResolver {
    /// Creates a resolver for the projects of `build`.
    #[must_use]
    pub fn new(
        build: impl Into<String>,
        projects: impl IntoIterator<Item = LocalProject>,
        registry: Arc<ComponentStateRegistry>,
    ) -> Self {
        Self {
            build: build.into(),
            projects: projects
                .into_iter()
                .map(|p| (p.path.clone(), p))
                .collect(),
            registry,
        }
    }
}

impl ComponentResolver for ProjectComponentResolver {
    fn name(&self) -> &'static str {
        "project"
    }

    fn resolve_selector(
        &self,
        selector: &ComponentSelector,
        _context: &ResolveContext<'_>,
    ) -> Result<Option<ComponentId>> {
        match selector {
            ComponentSelector::Project { path } if self.projects.contains_key(path) => {
                Ok(Some(ComponentId::project(self.build.clone(), path.clone())))
            }
            ComponentSelector::Project { .. } => Err(GraftError::ComponentNotFound {
                selector: selector.to_string(),
            }),
            ComponentSelector::Module { .. } => Ok(None),
        }
    }

    fn component_state(&self, id: &ComponentId) -> Result<Option<Arc<ComponentGraphResolveState>>> {
        let ComponentId::Project { build, path } = id else {
            return Ok(None);
        };
        if build != &self.build {
            return Ok(None);
        }
        Ok(self.projects.get(path).map(|project| {
            self.registry
                .state_for(id, &project.module_version_id, &project.configurations)
        }))
    }
}

/// Resolves module selectors against a [`ModuleRepository`].
///
/// Version listings are cached for the lifetime of the resolver, which is
/// one resolution.
#[derive(Debug)]
pub struct ModuleComponentResolver {
    repository: Arc<dyn ModuleRepository>,
    registry: Arc<ComponentStateRegistry>,
    versions: Mutex<HashMap<ModuleId, Arc<Vec<Version>>>>,
}

impl ModuleComponentResolver {
    /// Creates a resolver over `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn ModuleRepository>, registry: Arc<ComponentStateRegistry>) -> Self {
        Self {
            repository,
            registry,
            versions: Mutex::new(HashMap::new()),
        }
    }

    fn versions_of(&self, module: &ModuleId) -> Result<Arc<Vec<Version>>> {
        if let Some(cached) = self.versions.lock().get(module) {
            return Ok(Arc::clone(cached));
        }
        let listed = Arc::new(self.repository.list_versions(module)?);
        trace!(module = %module, count = listed.len(), "listed module versions");
        Ok(Arc::clone(
            self.versions
                .lock()
                .entry(module.clone())
                .or_insert(listed),
        ))
    }
}

impl ComponentResolver for ModuleComponentResolver {
    fn name(&self) -> &'static str {
        "module"
    }

    fn resolve_selector(
        &self,
        selector: &ComponentSelector,
        context: &ResolveContext<'_>,
    ) -> Result<Option<ComponentId>> {
        let ComponentSelector::Module { module, constraint } = selector else {
            return Ok(None);
        };
        let version_selector = constraint.selector();
        if version_selector.is_dynamic() && context.strategy.fails_on_dynamic_versions() {
            return Err(GraftError::DynamicVersion {
                selector: constraint.to_string(),
                module: module.to_string(),
            });
        }
        if let VersionSelector::Exact(version) = version_selector {
            return Ok(Some(ComponentId::Module(module.with_version(version.as_str()))));
        }
        let versions = self.versions_of(module)?;
        let selected = version_selector.select_highest(&versions).ok_or_else(|| {
            GraftError::NoMatchingVersion {
                selector: constraint.to_string(),
                module: module.to_string(),
            }
        })?;
        debug!(module = %module, selector = %constraint, version = %selected, "selected dynamic version");
        Ok(Some(ComponentId::Module(module.with_version(selected.as_str()))))
    }

    fn component_state(&self, id: &ComponentId) -> Result<Option<Arc<ComponentGraphResolveState>>> {
        let ComponentId::Module(module_version) = id else {
            return Ok(None);
        };
        if let Some(state) = self.registry.get(id) {
            return Ok(Some(state));
        }
        match self.repository.metadata(module_version)? {
            Some(metadata) => Ok(Some(self.registry.external_state_for(&metadata))),
            None => Err(GraftError::ComponentNotFound {
                selector: id.to_string(),
            }),
        }
    }
}

/// An ordered chain of component resolvers.
#[derive(Debug, Clone)]
pub struct ComponentResolversChain {
    resolvers: Vec<Arc<dyn ComponentResolver>>,
}

impl ComponentResolversChain {
    /// Creates a chain consulting `resolvers` in order.
    #[must_use]
    pub fn new(resolvers: Vec<Arc<dyn ComponentResolver>>) -> Self {
        Self { resolvers }
    }

    /// Assembles the chain for one resolution.
    ///
    /// The first capable factory in priority order contributes a resolver
    /// in front of `defaults`.
    #[must_use]
    pub fn build(
        factories: &[Arc<dyn ResolverProviderFactory>],
        context: &ResolveContext<'_>,
        defaults: Vec<Arc<dyn ComponentResolver>>,
    ) -> Self {
        let mut ordered: Vec<&Arc<dyn ResolverProviderFactory>> = factories.iter().collect();
        ordered.sort_by_key(|f| std::cmp::Reverse(f.priority()));
        let mut resolvers = Vec::with_capacity(defaults.len() + 1);
        if let Some(factory) = ordered.into_iter().find(|f| f.can_create(context)) {
            let resolver = factory.create(context);
            debug!(resolver = resolver.name(), root = %context.root, "using custom resolver");
            resolvers.push(resolver);
        }
        resolvers.extend(defaults);
        Self { resolvers }
    }

    /// Names of the resolvers, in consultation order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Maps `selector` to a component.
    ///
    /// # Errors
    ///
    /// Propagates resolver failures; returns [`GraftError::ComponentNotFound`]
    /// if no resolver handles the selector.
    pub fn resolve_selector(
        &self,
        selector: &ComponentSelector,
        context: &ResolveContext<'_>,
    ) -> Result<ComponentId> {
        for resolver in &self.resolvers {
            if let Some(id) = resolver.resolve_selector(selector, context)? {
                return Ok(id);
            }
        }
        Err(GraftError::ComponentNotFound {
            selector: selector.to_string(),
        })
    }

    /// Returns the state of `id`.
    ///
    /// # Errors
    ///
    /// Propagates resolver failures; returns [`GraftError::ComponentNotFound`]
    /// if no resolver handles the component.
    pub fn component_state(&self, id: &ComponentId) -> Result<Arc<ComponentGraphResolveState>> {
        for resolver in &self.resolvers {
            if let Some(state) = resolver.component_state(id)? {
                return Ok(state);
            }
        }
        Err(GraftError::ComponentNotFound {
            selector: id.to_string(),
        })
    }
}
