//! The dependency graph builder.
//!
//! One resolution runs two worklists. Pending modules are (re)selected
//! first: the distinct candidates of their live selector edges compete, the
//! winner is recorded, and every edge is attached to a variant of the
//! winner. Pending nodes are then expanded: each declared dependency is
//! substituted, filtered by the exclusions inherited along every path to the
//! node, and turned into a selector edge of its module.
//!
//! A module changing its winner evicts the previous winner's nodes. Eviction
//! detaches their outgoing edges and cascades to targets nothing else
//! reaches, so the final graph holds only nodes reachable from the root.
//! Variant candidates of each component are captured once per resolution
//! and reused, even if the component is reevaluated meanwhile.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use graft_common::attributes::{Attributes, best_matches};
use graft_common::capability::Capability;
use graft_common::constants::DEFAULT_CONFIGURATION;
use graft_common::error::{GraftError, Result};
use graft_common::selector::VersionSelector;
use graft_common::types::{ComponentId, ComponentSelector, ModuleId};
use graft_common::version::Version;
use graft_model::candidates::GraphSelectionCandidates;
use graft_model::dependency::{DependencyMetadata, ExcludeRule};
use graft_model::state::{ComponentGraphResolveState, VariantGraphResolveState};
use tracing::{debug, info, trace, warn};

use super::result::{ResolvedEdge, ResolvedGraph, ResolvedNode};
use super::state::{EdgeId, EdgeState, ModuleResolveState, NodeId, NodeState};
use super::visitor::DependencyGraphVisitor;
use crate::conflict::{
    CapabilityCandidate, CapabilityConflictHandler, ModuleCandidate, ModuleConflictHandler,
};
use crate::context::ResolveContext;
use crate::reason::{SelectionCause, SelectionDescriptor, SelectionReason};
use crate::resolver::ComponentResolversChain;
use crate::strategy::ResolutionStrategy;

const ROOT: NodeId = 0;

/// Builds dependency graphs for one strategy and resolver chain.
#[derive(Debug)]
pub struct DependencyGraphBuilder<'a> {
    strategy: &'a ResolutionStrategy,
    resolvers: &'a ComponentResolversChain,
    module_conflicts: ModuleConflictHandler,
    capability_conflicts: CapabilityConflictHandler,
}

impl<'a> DependencyGraphBuilder<'a> {
    /// Creates a builder with the conflict handlers the strategy calls for.
    #[must_use]
    pub fn new(strategy: &'a ResolutionStrategy, resolvers: &'a ComponentResolversChain) -> Self {
        Self {
            strategy,
            resolvers,
            module_conflicts: ModuleConflictHandler::new(strategy.conflict_resolution()),
            capability_conflicts: CapabilityConflictHandler::for_strictness(strategy.is_strict()),
        }
    }

    /// Replaces the module conflict handler.
    #[must_use]
    pub fn with_module_conflict_handler(mut self, handler: ModuleConflictHandler) -> Self {
        self.module_conflicts = handler;
        self
    }

    /// Replaces the capability conflict handler.
    #[must_use]
    pub fn with_capability_conflict_handler(mut self, handler: CapabilityConflictHandler) -> Self {
        self.capability_conflicts = handler;
        self
    }

    /// Resolves the graph rooted at `root_variant` of `root`.
    ///
    /// `visitor` sees the final graph, or the partial graph and the failure
    /// when the resolution fails after the root was seeded.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::ConfigurationNotFound`] if the root variant does
    /// not exist, and any selection, conflict, or variant matching failure
    /// met while building the graph.
    pub fn resolve(
        &self,
        root: &Arc<ComponentGraphResolveState>,
        root_variant: &str,
        visitor: &mut dyn DependencyGraphVisitor,
    ) -> Result<ResolvedGraph> {
        let variant = root.root_variant(root_variant)?;
        info!(
            root = %root.id(),
            variant = root_variant,
            conflicts = self.module_conflicts.resolver_name(),
            "building dependency graph"
        );
        let context = ResolveContext::new(root.id(), root_variant, self.strategy);
        let mut build = GraphBuild::new(self, context, root, variant);
        let outcome = build.run();
        let graph = build.into_graph();
        match &outcome {
            Ok(()) => debug!(
                root = %root.id(),
                nodes = graph.nodes().len(),
                edges = graph.edges().len(),
                "dependency graph built"
            ),
            Err(err) => warn!(
                root = %root.id(),
                nodes = graph.nodes().len(),
                error = %err,
                "dependency graph build failed"
            ),
        }
        graph.visit(visitor, outcome.as_ref().err());
        outcome.map(|()| graph)
    }
}

struct GraphBuild<'r> {
    strategy: &'r ResolutionStrategy,
    resolvers: &'r ComponentResolversChain,
    module_conflicts: &'r ModuleConflictHandler,
    capability_conflicts: &'r CapabilityConflictHandler,
    context: ResolveContext<'r>,
    consumer_attributes: Attributes,
    nodes: Vec<NodeState>,
    edges: Vec<EdgeState>,
    modules: HashMap<ModuleId, ModuleResolveState>,
    node_index: HashMap<(ComponentId, String), NodeId>,
    nodes_by_component: HashMap<ComponentId, Vec<NodeId>>,
    states: HashMap<ComponentId, Arc<ComponentGraphResolveState>>,
    candidates: HashMap<ComponentId, Arc<GraphSelectionCandidates>>,
    selections: HashMap<ComponentSelector, ComponentId>,
    capabilities: HashMap<String, Vec<NodeId>>,
    pending_modules: VecDeque<ModuleId>,
    queued_modules: HashSet<ModuleId>,
    pending_nodes: VecDeque<NodeId>,
}

impl<'r> GraphBuild<'r> {
    fn new(
        builder: &'r DependencyGraphBuilder<'_>,
        context: ResolveContext<'r>,
        root: &Arc<ComponentGraphResolveState>,
        variant: Arc<VariantGraphResolveState>,
    ) -> Self {
        let consumer_attributes = builder
            .strategy
            .consumer_attributes()
            .merged_with(variant.metadata().attributes());
        let module = builder
            .strategy
            .replacements()
            .route(root.module_version_id().module());
        let variant_name = variant.name().to_string();
        let mut node = NodeState::new(
            root.id().clone(),
            root.module_version_id().clone(),
            module.clone(),
            variant,
        );
        node.excludes = Some(BTreeSet::new());
        node.endorsing = true;

        let mut build = Self {
            strategy: builder.strategy,
            resolvers: builder.resolvers,
            module_conflicts: &builder.module_conflicts,
            capability_conflicts: &builder.capability_conflicts,
            context,
            consumer_attributes,
            nodes: vec![node],
            edges: Vec::new(),
            modules: HashMap::new(),
            node_index: HashMap::new(),
            nodes_by_component: HashMap::new(),
            states: HashMap::new(),
            candidates: HashMap::new(),
            selections: HashMap::new(),
            capabilities: HashMap::new(),
            pending_modules: VecDeque::new(),
            queued_modules: HashSet::new(),
            pending_nodes: VecDeque::new(),
        };
        let _ = build.modules.insert(
            module,
            ModuleResolveState {
                selected: Some(root.id().clone()),
                reason: SelectionReason::of(SelectionCause::Root),
                ..ModuleResolveState::default()
            },
        );
        let _ = build
            .node_index
            .insert((root.id().clone(), variant_name), ROOT);
        let _ = build
            .nodes_by_component
            .insert(root.id().clone(), vec![ROOT]);
        let _ = build.states.insert(root.id().clone(), Arc::clone(root));
        for capability in &build.nodes[ROOT].capabilities {
            build.capabilities.entry(capability.key()).or_default().push(ROOT);
        }
        build.enqueue_node(ROOT);
        build
    }

    fn run(&mut self) -> Result<()> {
        loop {
            if let Some(module) = self.pending_modules.pop_front() {
                let _ = self.queued_modules.remove(&module);
                self.select_module(&module)?;
            } else if let Some(node) = self.pending_nodes.pop_front() {
                self.nodes[node].queued = false;
                self.expand(node)?;
            } else {
                return Ok(());
            }
        }
    }

    fn enqueue_module(&mut self, module: &ModuleId) {
        if self.queued_modules.insert(module.clone()) {
            self.pending_modules.push_back(module.clone());
        }
    }

    fn enqueue_node(&mut self, node: NodeId) {
        if !self.nodes[node].queued {
            self.nodes[node].queued = true;
            self.pending_nodes.push_back(node);
        }
    }

    fn expand(&mut self, node: NodeId) -> Result<()> {
        if !self.nodes[node].selected {
            return Ok(());
        }
        if self.nodes[node].expanded {
            for orphan in self.detach_outgoing(node) {
                self.deselect(orphan);
            }
        }
        self.nodes[node].expanded = true;
        let excludes = self.nodes[node].excludes.clone().unwrap_or_default();
        let variant = Arc::clone(&self.nodes[node].variant);
        trace!(
            component = %self.nodes[node].component,
            variant = variant.name(),
            "expanding node"
        );
        for declared in variant.metadata().dependencies() {
            let (dependency, substitution) = match self.strategy.substitute(&declared.selector) {
                Some((selector, descriptor)) => (
                    DependencyMetadata {
                        selector,
                        ..declared.clone()
                    },
                    Some(descriptor),
                ),
                None => (declared.clone(), None),
            };
            if is_excluded(&excludes, &declared.selector)
                || is_excluded(&excludes, &dependency.selector)
            {
                debug!(
                    from = %self.nodes[node].component,
                    dependency = %declared.selector,
                    "dependency excluded"
                );
                continue;
            }
            self.add_edge(node, declared.selector.clone(), dependency, substitution)?;
        }
        Ok(())
    }

    fn add_edge(
        &mut self,
        from: NodeId,
        requested: ComponentSelector,
        dependency: DependencyMetadata,
        substitution: Option<SelectionDescriptor>,
    ) -> Result<()> {
        let candidate = self.select_component(&dependency.selector)?;
        let state = self.component_state(&candidate)?;
        let module = self
            .strategy
            .replacements()
            .route(state.module_version_id().module());
        let edge = self.edges.len();
        self.edges.push(EdgeState {
            from,
            requested,
            dependency,
            substitution,
            module: module.clone(),
            candidate,
            target: None,
        });
        self.nodes[from].outgoing.push(edge);
        self.modules
            .entry(module.clone())
            .or_default()
            .selectors
            .push(edge);
        self.enqueue_module(&module);
        Ok(())
    }

    fn select_component(&mut self, selector: &ComponentSelector) -> Result<ComponentId> {
        if let Some(id) = self.selections.get(selector) {
            return Ok(id.clone());
        }
        let forced = match selector {
            ComponentSelector::Module { module, .. } => self
                .strategy
                .forced_version(module)
                .map(|version| ComponentId::Module(module.with_version(version))),
            ComponentSelector::Project { .. } => None,
        };
        let id = match forced {
            Some(id) => id,
            None => self.resolvers.resolve_selector(selector, &self.context)?,
        };
        trace!(selector = %selector, component = %id, "selector resolved");
        let _ = self.selections.insert(selector.clone(), id.clone());
        Ok(id)
    }

    fn component_state(&mut self, id: &ComponentId) -> Result<Arc<ComponentGraphResolveState>> {
        if let Some(state) = self.states.get(id) {
            return Ok(Arc::clone(state));
        }
        let state = self.resolvers.component_state(id)?;
        let _ = self.states.insert(id.clone(), Arc::clone(&state));
        Ok(state)
    }

    fn candidates_of(
        &mut self,
        state: &ComponentGraphResolveState,
    ) -> Result<Arc<GraphSelectionCandidates>> {
        if let Some(candidates) = self.candidates.get(state.id()) {
            return Ok(Arc::clone(candidates));
        }
        let candidates = state.candidates_for_graph_variant_selection()?;
        let _ = self
            .candidates
            .insert(state.id().clone(), Arc::clone(&candidates));
        Ok(candidates)
    }

    fn select_module(&mut self, module: &ModuleId) -> Result<()> {
        let Some(state) = self.modules.get(module) else {
            return Ok(());
        };
        let selectors = state.selectors.clone();
        let previous = state.selected.clone();
        let replaced_by = state.replaced_by;
        let root_module = self.nodes[ROOT].module == *module;

        if let Some(replacement) = replaced_by {
            if self.nodes[replacement].selected {
                for edge in selectors {
                    if self.nodes[self.edges[edge].from].selected {
                        self.attach_to_node(edge, replacement);
                    }
                }
                return Ok(());
            }
            if let Some(state) = self.modules.get_mut(module) {
                state.replaced_by = None;
            }
        }

        if selectors.is_empty() {
            if !root_module {
                if let Some(previous) = previous {
                    trace!(module = %module, component = %previous, "module no longer requested");
                    self.evict_component(&previous);
                }
                if let Some(state) = self.modules.get_mut(module) {
                    state.selected = None;
                    state.reason = SelectionReason::default();
                }
            }
            return Ok(());
        }

        let (candidates, replaced) = self.module_candidates(module, &selectors, root_module)?;
        let strict_bounds = self.strict_bounds(&selectors);
        let mut outcome = self
            .module_conflicts
            .resolve(module, &candidates, &strict_bounds)?;
        if candidates.len() == 1 && outcome.cause == SelectionCause::ConflictResolution {
            outcome.cause = SelectionCause::Requested;
        }
        let winner = candidates[outcome.winner].component.clone();

        let mut reason = SelectionReason::default();
        if outcome.cause != SelectionCause::Root {
            reason.add(SelectionDescriptor::of(SelectionCause::Requested));
        }
        reason.add(SelectionDescriptor::of(outcome.cause));
        for replaced_module in replaced {
            let description = self
                .strategy
                .replacements()
                .because(&replaced_module)
                .map_or_else(|| format!("{replaced_module} replaced with {module}"), str::to_string);
            reason.add(SelectionDescriptor::described(
                SelectionCause::Replacement,
                description,
            ));
        }
        for &edge in &selectors {
            if self.edges[edge].candidate == winner {
                if let Some(descriptor) = &self.edges[edge].substitution {
                    reason.add(descriptor.clone());
                }
            }
        }

        if previous.as_ref() != Some(&winner) {
            match &previous {
                Some(previous) => {
                    debug!(module = %module, from = %previous, to = %winner, reason = %reason, "module selection changed");
                    self.evict_component(previous);
                }
                None => trace!(module = %module, component = %winner, "module selected"),
            }
        }
        if let Some(state) = self.modules.get_mut(module) {
            state.selected = Some(winner.clone());
            state.reason = reason;
        }

        for edge in selectors {
            let still_winner = self
                .modules
                .get(module)
                .is_some_and(|s| s.selected.as_ref() == Some(&winner));
            if !still_winner {
                break;
            }
            if !self.nodes[self.edges[edge].from].selected {
                continue;
            }
            let attached = self.edges[edge]
                .target
                .is_some_and(|t| self.nodes[t].selected && self.nodes[t].component == winner);
            if !attached {
                self.attach(edge, &winner)?;
            }
        }
        Ok(())
    }

    /// Collects the distinct candidates of a module, pinning the root.
    ///
    /// When the replacement module competes with modules it replaces, the
    /// replaced ones are dropped and returned.
    fn module_candidates(
        &mut self,
        module: &ModuleId,
        selectors: &[EdgeId],
        root_module: bool,
    ) -> Result<(Vec<ModuleCandidate>, Vec<ModuleId>)> {
        let mut candidates: Vec<(ModuleCandidate, ModuleId)> = Vec::new();
        if root_module {
            let root = self.nodes[ROOT].component.clone();
            let own = self.nodes[ROOT].module_version.module().clone();
            let version = Version::parse(self.nodes[ROOT].module_version.version())?;
            let mut candidate = ModuleCandidate::new(root, version);
            candidate.root = true;
            candidates.push((candidate, own));
        }
        for &edge in selectors {
            let component = self.edges[edge].candidate.clone();
            let forced = self.edges[edge].dependency.force || self.forced_by_strategy(&component);
            if let Some((existing, _)) = candidates.iter_mut().find(|(c, _)| c.component == component) {
                existing.forced |= forced;
                continue;
            }
            let state = self.component_state(&component)?;
            let version = Version::parse(state.module_version_id().version())?;
            let mut candidate = ModuleCandidate::new(component, version);
            candidate.forced = forced;
            candidates.push((candidate, state.module_version_id().module().clone()));
        }

        let has_replacement = candidates.iter().any(|(_, own)| own == module);
        let mut replaced = Vec::new();
        if has_replacement && candidates.iter().any(|(_, own)| own != module) {
            candidates.retain(|(_, own)| {
                let keep = own == module;
                if !keep && !replaced.contains(own) {
                    replaced.push(own.clone());
                }
                keep
            });
        }
        Ok((candidates.into_iter().map(|(c, _)| c).collect(), replaced))
    }

    fn forced_by_strategy(&self, component: &ComponentId) -> bool {
        match component {
            ComponentId::Module(id) => {
                self.strategy.forced_version(id.module()) == Some(id.version())
            }
            ComponentId::Project { .. } => false,
        }
    }

    /// Strict selectors declared by endorsing nodes on `selectors`.
    fn strict_bounds(&self, selectors: &[EdgeId]) -> Vec<VersionSelector> {
        selectors
            .iter()
            .filter(|&&e| self.nodes[self.edges[e].from].endorsing)
            .filter_map(|&e| match &self.edges[e].dependency.selector {
                ComponentSelector::Module { constraint, .. } if constraint.is_strict() => {
                    Some(constraint.selector().clone())
                }
                _ => None,
            })
            .collect()
    }

    fn attach(&mut self, edge: EdgeId, component: &ComponentId) -> Result<()> {
        let state = self.component_state(component)?;
        let candidates = self.candidates_of(&state)?;
        let variant = self.select_variant(edge, &state, &candidates)?;
        let node = self.admit(&state, variant)?;
        let node = self.effective_node(node);
        self.attach_to_node(edge, node);
        Ok(())
    }

    fn effective_node(&self, node: NodeId) -> NodeId {
        if self.nodes[node].selected {
            return node;
        }
        self.modules
            .get(&self.nodes[node].module)
            .and_then(|m| m.replaced_by)
            .filter(|&r| self.nodes[r].selected)
            .unwrap_or(node)
    }

    fn attach_to_node(&mut self, edge: EdgeId, node: NodeId) {
        if let Some(previous) = self.edges[edge].target.take() {
            self.nodes[previous].incoming.retain(|&e| e != edge);
            if previous != node && previous != ROOT && self.nodes[previous].incoming.is_empty() {
                self.deselect(previous);
            }
        }
        self.edges[edge].target = Some(node);
        self.nodes[node].incoming.push(edge);
        self.inherit_excludes(edge, node);
        self.inherit_endorsement(edge, node);
    }

    fn select_variant(
        &self,
        edge: EdgeId,
        state: &ComponentGraphResolveState,
        candidates: &GraphSelectionCandidates,
    ) -> Result<Arc<VariantGraphResolveState>> {
        let dependency = &self.edges[edge].dependency;
        let component = state.id().display_name();

        if let Some(name) = &dependency.target_configuration {
            return candidates
                .variant_by_configuration_name(name)
                .ok_or_else(|| match state.configuration_flags(name) {
                    Some(flags) if !flags.consumable => GraftError::ConfigurationNotConsumable {
                        name: name.clone(),
                        component: component.clone(),
                        requester: self.nodes[self.edges[edge].from].component.display_name(),
                    },
                    _ => GraftError::ConfigurationNotFound {
                        name: name.clone(),
                        component: component.clone(),
                    },
                });
        }

        if !candidates.supports_attribute_matching() {
            return candidates
                .variant_by_configuration_name(DEFAULT_CONFIGURATION)
                .ok_or_else(|| GraftError::ConfigurationNotFound {
                    name: DEFAULT_CONFIGURATION.to_string(),
                    component,
                });
        }

        let implicit = Capability::implicit(state.module_version_id()).key();
        let required: Vec<String> = if dependency.capabilities.is_empty() {
            vec![implicit.clone()]
        } else {
            dependency.capabilities.iter().map(Capability::key).collect()
        };
        let eligible: Vec<Arc<VariantGraphResolveState>> = candidates
            .variants_for_attribute_matching()?
            .iter()
            .filter(|v| provides(v, &implicit, &required))
            .cloned()
            .collect();
        let requested = self.consumer_attributes.merged_with(&dependency.attributes);
        match best_matches(&requested, &eligible, |v| v.metadata().attributes()).as_slice() {
            [only] => Ok(Arc::clone(*only)),
            [] => Err(GraftError::NoMatchingVariant {
                component,
                requested: requested.to_string(),
            }),
            several => Err(GraftError::AmbiguousVariantSelection {
                component,
                requested: requested.to_string(),
                candidates: several.iter().map(|v| v.name().to_string()).collect(),
            }),
        }
    }

    /// Returns the node of `variant`, creating or reselecting it.
    fn admit(
        &mut self,
        state: &ComponentGraphResolveState,
        variant: Arc<VariantGraphResolveState>,
    ) -> Result<NodeId> {
        let key = (state.id().clone(), variant.name().to_string());
        let node = match self.node_index.get(&key) {
            Some(&existing) if self.nodes[existing].selected => return Ok(existing),
            Some(&existing) => {
                self.nodes[existing].selected = true;
                existing
            }
            None => {
                let module = self
                    .strategy
                    .replacements()
                    .route(state.module_version_id().module());
                let node = self.nodes.len();
                self.nodes.push(NodeState::new(
                    state.id().clone(),
                    state.module_version_id().clone(),
                    module,
                    variant,
                ));
                let _ = self.node_index.insert(key, node);
                self.nodes_by_component
                    .entry(state.id().clone())
                    .or_default()
                    .push(node);
                node
            }
        };
        trace!(component = %state.id(), variant = %self.nodes[node].variant.name(), "node selected");
        self.enqueue_node(node);
        self.claim_capabilities(node)?;
        Ok(node)
    }

    fn claim_capabilities(&mut self, node: NodeId) -> Result<()> {
        let capabilities = self.nodes[node].capabilities.clone();
        for capability in capabilities {
            if !self.nodes[node].selected {
                break;
            }
            let key = capability.key();
            let claims = self.capabilities.entry(key.clone()).or_default();
            if !claims.contains(&node) {
                claims.push(node);
            }
            let holders = claims.clone();
            let competing: Vec<CapabilityCandidate> = holders
                .into_iter()
                .filter(|&h| self.nodes[h].selected)
                .map(|h| CapabilityCandidate {
                    node: h,
                    component: self.nodes[h].component.clone(),
                    capability: self.nodes[h]
                        .capabilities
                        .iter()
                        .find(|c| c.key() == key)
                        .cloned()
                        .unwrap_or_else(|| capability.clone()),
                    root: h == ROOT,
                })
                .collect();
            let components: BTreeSet<&ComponentId> = competing.iter().map(|c| &c.component).collect();
            if components.len() < 2 {
                continue;
            }
            let winner = self.capability_conflicts.resolve(&key, &competing)?;
            let winner_node = competing[winner].node;
            let losers: BTreeSet<ComponentId> = competing
                .iter()
                .filter(|c| c.component != competing[winner].component)
                .map(|c| c.component.clone())
                .collect();
            for loser in losers {
                self.reject(&loser, winner_node, &key);
            }
        }
        Ok(())
    }

    /// Evicts the loser of a capability conflict and routes its module to the winner.
    fn reject(&mut self, loser: &ComponentId, winner: NodeId, capability: &str) {
        let Some(module) = self
            .nodes_by_component
            .get(loser)
            .and_then(|nodes| nodes.first())
            .map(|&n| self.nodes[n].module.clone())
        else {
            return;
        };
        info!(
            capability,
            winner = %self.nodes[winner].component,
            loser = %loser,
            "capability conflict resolved"
        );
        self.evict_component(loser);
        if let Some(state) = self.modules.get_mut(&module) {
            state.replaced_by = Some(winner);
            if state.selected.as_ref() == Some(loser) {
                state.selected = None;
            }
        }
        self.nodes[winner].reason.add(SelectionDescriptor::described(
            SelectionCause::CapabilityConflict,
            format!("{capability} also provided by {loser}"),
        ));
        self.enqueue_module(&module);
    }

    fn evict_component(&mut self, component: &ComponentId) {
        let nodes = self
            .nodes_by_component
            .get(component)
            .cloned()
            .unwrap_or_default();
        for node in nodes {
            self.deselect(node);
        }
    }

    /// Removes a node and, transitively, the targets only it reached.
    fn deselect(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current == ROOT || !self.nodes[current].selected {
                continue;
            }
            trace!(component = %self.nodes[current].component, "node deselected");
            self.nodes[current].deselect();
            for capability in &self.nodes[current].capabilities {
                if let Some(claims) = self.capabilities.get_mut(&capability.key()) {
                    claims.retain(|&n| n != current);
                }
            }
            let displaced: Vec<ModuleId> = self
                .modules
                .iter()
                .filter(|(_, m)| m.replaced_by == Some(current))
                .map(|(id, _)| id.clone())
                .collect();
            for module in displaced {
                trace!(module = %module, "capability winner left the graph, reselecting");
                self.enqueue_module(&module);
            }
            stack.extend(self.detach_outgoing(current));
        }
    }

    /// Detaches every outgoing edge of `node`, returning targets left unreached.
    fn detach_outgoing(&mut self, node: NodeId) -> Vec<NodeId> {
        let outgoing = std::mem::take(&mut self.nodes[node].outgoing);
        let mut orphans = Vec::new();
        for edge in outgoing {
            let module = self.edges[edge].module.clone();
            if let Some(state) = self.modules.get_mut(&module) {
                state.selectors.retain(|&e| e != edge);
            }
            self.enqueue_module(&module);
            if let Some(target) = self.edges[edge].target.take() {
                self.nodes[target].incoming.retain(|&e| e != edge);
                if target != ROOT && self.nodes[target].incoming.is_empty() {
                    orphans.push(target);
                }
            }
        }
        orphans
    }

    /// Narrows the target's exclusions to those shared by every path to it.
    fn inherit_excludes(&mut self, edge: EdgeId, node: NodeId) {
        if node == ROOT {
            return;
        }
        let from = self.edges[edge].from;
        let mut via = self.nodes[from].excludes.clone().unwrap_or_default();
        via.extend(self.edges[edge].dependency.excludes.iter().cloned());
        let next = match &self.nodes[node].excludes {
            None => via,
            Some(current) => current.intersection(&via).cloned().collect(),
        };
        if self.nodes[node].excludes.as_ref() == Some(&next) {
            return;
        }
        let narrowed = self.nodes[node].excludes.is_some();
        self.nodes[node].excludes = Some(next);
        if narrowed && self.nodes[node].expanded {
            trace!(component = %self.nodes[node].component, "exclusions narrowed, expanding again");
            self.enqueue_node(node);
        }
    }

    fn inherit_endorsement(&mut self, edge: EdgeId, node: NodeId) {
        if !self.edges[edge].dependency.endorse_strict_versions || self.nodes[node].endorsing {
            return;
        }
        self.nodes[node].endorsing = true;
        let modules: Vec<ModuleId> = self.nodes[node]
            .outgoing
            .iter()
            .map(|&e| self.edges[e].module.clone())
            .collect();
        for module in modules {
            self.enqueue_module(&module);
        }
    }

    fn into_graph(self) -> ResolvedGraph {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.selected)
            .map(|(id, n)| {
                let mut reason = self
                    .modules
                    .get(&n.module)
                    .filter(|m| m.selected.as_ref() == Some(&n.component))
                    .map_or_else(
                        || SelectionReason::of(SelectionCause::Requested),
                        |m| m.reason.clone(),
                    );
                reason.merge(&n.reason);
                let metadata = n.variant.metadata();
                ResolvedNode {
                    id,
                    component: n.component.clone(),
                    module_version: n.module_version.clone(),
                    variant: n.variant.name().to_string(),
                    attributes: metadata.attributes().clone(),
                    capabilities: metadata.capabilities().to_vec(),
                    reason,
                    state: Arc::clone(&n.variant),
                }
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .filter(|e| self.nodes[e.from].selected)
            .filter_map(|e| {
                e.target
                    .filter(|&t| self.nodes[t].selected)
                    .map(|to| ResolvedEdge {
                        from: e.from,
                        to,
                        requested: e.requested.to_string(),
                    })
            })
            .collect();
        ResolvedGraph::new(ROOT, nodes, edges)
    }
}

fn is_excluded(excludes: &BTreeSet<ExcludeRule>, selector: &ComponentSelector) -> bool {
    match selector {
        ComponentSelector::Module { module, .. } => excludes.iter().any(|rule| rule.matches(module)),
        ComponentSelector::Project { .. } => false,
    }
}

/// Whether `variant` offers every `required` capability.
///
/// A variant without declared capabilities offers only the implicit one of
/// its component. Declaring any capability replaces the implicit one, so a
/// variant that should still be selected by plain module requests lists it.
fn provides(variant: &VariantGraphResolveState, implicit: &str, required: &[String]) -> bool {
    let declared = variant.metadata().capabilities();
    if declared.is_empty() {
        return required.iter().all(|r| r == implicit);
    }
    required
        .iter()
        .all(|r| declared.iter().any(|c| &c.key() == r))
}

#[cfg(test)]
mod tests {
    use graft_common::config::ConflictResolution;
    use graft_common::constants::ROOT_BUILD_NAME;
    use graft_common::selector::VersionConstraint;
    use graft_common::types::ModuleVersionId;
    use graft_model::artifact::ArtifactMetadata;
    use graft_model::configuration::{ConfigurationDefinition, ConfigurationsProvider};
    use graft_model::registry::ComponentStateRegistry;
    use graft_model::repository::{ExternalModuleMetadata, InMemoryRepository, ModuleRepository};
    use graft_model::variant::VariantMetadata;

    use super::*;
    use crate::graph::visitor::{
        BuildOperationVisitor, CompositeDependencyGraphVisitor, ResolutionEvent,
        ResolvedArtifactsGraphVisitor, SerializingGraphVisitor,
    };
    use crate::resolver::{LocalProject, ModuleComponentResolver, ProjectComponentResolver};
    use crate::strategy::DependencySubstitution;

    fn dep(notation: &str) -> DependencyMetadata {
        let (module, constraint) = notation.rsplit_once(':').expect("g:n:v");
        DependencyMetadata::new(ComponentSelector::module(
            module.parse().expect("module"),
            constraint.parse::<VersionConstraint>().expect("constraint"),
        ))
    }

    fn library(id: &str, dependencies: Vec<DependencyMetadata>) -> ExternalModuleMetadata {
        ExternalModuleMetadata::new(id.parse().expect("id")).with_variant(
            VariantMetadata::new("runtime")
                .with_attribute("usage", "runtime")
                .with_dependencies(dependencies),
        )
    }

    fn module(group: &str, name: &str, version: &str) -> ComponentId {
        ComponentId::module(group, name, version)
    }

    struct Fixture {
        registry: Arc<ComponentStateRegistry>,
        repository: Arc<InMemoryRepository>,
        projects: Vec<LocalProject>,
    }

    impl Fixture {
        fn new(root_dependencies: Vec<DependencyMetadata>) -> Self {
            let mut fixture = Self {
                registry: Arc::new(ComponentStateRegistry::new()),
                repository: Arc::new(InMemoryRepository::new()),
                projects: Vec::new(),
            };
            let mut classpath =
                ConfigurationDefinition::resolvable("runtimeClasspath").with_attribute("usage", "runtime");
            for dependency in root_dependencies {
                classpath = classpath.with_dependency(dependency);
            }
            fixture.project(":app", "app", vec![classpath]);
            fixture
        }

        fn project(&mut self, path: &str, name: &str, configurations: Vec<ConfigurationDefinition>) {
            self.projects.push(LocalProject {
                path: path.to_string(),
                module_version_id: ModuleVersionId::new("test", name, "unspecified"),
                configurations: Arc::new(ConfigurationsProvider::with_configurations(configurations)),
            });
        }

        fn publish(&self, metadata: ExternalModuleMetadata) {
            self.repository.publish(metadata);
        }

        fn chain(&self) -> ComponentResolversChain {
            let projects = ProjectComponentResolver::new(
                ROOT_BUILD_NAME,
                self.projects.clone(),
                Arc::clone(&self.registry),
            );
            let repository: Arc<dyn ModuleRepository> = self.repository.clone();
            let modules = ModuleComponentResolver::new(repository, Arc::clone(&self.registry));
            ComponentResolversChain::new(vec![Arc::new(projects), Arc::new(modules)])
        }

        fn resolve_with(
            &self,
            strategy: &ResolutionStrategy,
            visitor: &mut dyn DependencyGraphVisitor,
        ) -> Result<ResolvedGraph> {
            let chain = self.chain();
            let root = chain
                .component_state(&ComponentId::project(ROOT_BUILD_NAME, ":app"))
                .expect("root state");
            DependencyGraphBuilder::new(strategy, &chain).resolve(&root, "runtimeClasspath", visitor)
        }

        fn resolve(&self, strategy: &ResolutionStrategy) -> Result<ResolvedGraph> {
            self.resolve_with(strategy, &mut BuildOperationVisitor::new())
        }
    }

    fn components(graph: &ResolvedGraph) -> Vec<String> {
        graph.nodes().iter().map(|n| n.component.to_string()).collect()
    }

    #[test]
    fn latest_conflict_keeps_highest_version_only() {
        let fixture = Fixture::new(vec![dep("g:a:1.0"), dep("g:b:1.0")]);
        fixture.publish(library("g:a:1.0", vec![dep("g:gone:1.0")]));
        fixture.publish(library("g:gone:1.0", vec![]));
        fixture.publish(library("g:a:2.0", vec![]));
        fixture.publish(library("g:b:1.0", vec![dep("g:a:2.0")]));

        let graph = fixture.resolve(&ResolutionStrategy::default()).expect("graph");

        let a = graph.nodes_of_module(&ModuleId::new("g", "a"));
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].component, module("g", "a", "2.0"));
        assert!(a[0].reason.is_conflict_resolution());
        assert!(graph.nodes_of_module(&ModuleId::new("g", "gone")).is_empty());
        let root = graph.root().expect("root");
        let targets: Vec<&ComponentId> = graph
            .dependencies_of(root.id)
            .into_iter()
            .map(|n| &n.component)
            .collect();
        assert_eq!(targets, vec![&module("g", "a", "2.0"), &module("g", "b", "1.0")]);
    }

    #[test]
    fn strict_conflict_fails_and_visitors_see_partial_graph() {
        let fixture = Fixture::new(vec![dep("g:a:1.0"), dep("g:b:1.0")]);
        fixture.publish(library("g:a:1.0", vec![]));
        fixture.publish(library("g:a:2.0", vec![]));
        fixture.publish(library("g:b:1.0", vec![dep("g:a:2.0")]));

        let mut serializer = SerializingGraphVisitor::new();
        let mut operations = BuildOperationVisitor::new();
        let mut visitor = CompositeDependencyGraphVisitor::new()
            .with(&mut serializer)
            .with(&mut operations);
        let err = fixture
            .resolve_with(&ResolutionStrategy::new(ConflictResolution::Strict), &mut visitor)
            .expect_err("conflict");

        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "conflict found for module 'g:a': versions 1.0, 2.0");
        assert!(serializer.failure().is_some());
        let json = serializer.json().expect("partial graph");
        assert!(!json["nodes"].as_array().expect("nodes").is_empty());
        assert!(matches!(
            operations.events().last(),
            Some(ResolutionEvent::Finished { failure: Some(_), .. })
        ));
    }

    #[test]
    fn cycles_terminate_with_one_node_per_component() {
        let fixture = Fixture::new(vec![dep("g:x:1.0")]);
        fixture.publish(library("g:x:1.0", vec![dep("g:y:1.0")]));
        fixture.publish(library("g:y:1.0", vec![dep("g:x:1.0")]));

        let graph = fixture.resolve(&ResolutionStrategy::default()).expect("graph");

        assert_eq!(graph.nodes().len(), 3);
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(
            graph.cycles(),
            vec![vec![module("g", "x", "1.0"), module("g", "y", "1.0")]]
        );
    }

    fn logging(name: &str, version: &str) -> ExternalModuleMetadata {
        ExternalModuleMetadata::new(ModuleVersionId::new("g", name, "1.0")).with_variant(
            VariantMetadata::new("runtime")
                .with_attribute("usage", "runtime")
                .with_capability(Capability::new("g", name, Some("1.0".to_string())))
                .with_capability(Capability::new("g", "logging", Some(version.to_string()))),
        )
    }

    #[test]
    fn capability_conflict_keeps_one_provider() {
        let fixture = Fixture::new(vec![dep("g:log-a:1.0"), dep("g:log-b:1.0")]);
        fixture.publish(logging("log-a", "1.0"));
        fixture.publish(logging("log-b", "2.0"));

        let graph = fixture.resolve(&ResolutionStrategy::default()).expect("graph");

        assert_eq!(components(&graph), vec!["project :app", "g:log-b:1.0"]);
        let winner = graph.nodes_of_module(&ModuleId::new("g", "log-b"))[0];
        assert!(winner.reason.contains(SelectionCause::CapabilityConflict));
        let requests: Vec<&str> = graph
            .edges()
            .iter()
            .filter(|e| e.to == winner.id)
            .map(|e| e.requested.as_str())
            .collect();
        assert_eq!(requests, vec!["g:log-a:1.0", "g:log-b:1.0"]);
    }

    #[test]
    fn capability_conflict_fails_under_strict_strategy() {
        let fixture = Fixture::new(vec![dep("g:log-a:1.0"), dep("g:log-b:1.0")]);
        fixture.publish(logging("log-a", "1.0"));
        fixture.publish(logging("log-b", "2.0"));

        let err = fixture
            .resolve(&ResolutionStrategy::new(ConflictResolution::Strict))
            .expect_err("conflict");
        assert!(matches!(err, GraftError::CapabilityConflict { ref capability, .. } if capability == "g:logging"));
    }

    #[test]
    fn capability_loser_returns_when_the_winner_is_evicted() {
        let fixture = Fixture::new(vec![dep("g:log-a:1.0"), dep("g:log-b:1.0"), dep("g:c:1.0")]);
        fixture.publish(logging("log-a", "1.0"));
        fixture.publish(logging("log-b", "2.0"));
        fixture.publish(library("g:log-b:2.0", vec![]));
        fixture.publish(library("g:c:1.0", vec![dep("g:log-b:2.0")]));

        let graph = fixture.resolve(&ResolutionStrategy::default()).expect("graph");

        assert_eq!(graph.nodes().len(), 4);
        let log_a = graph.nodes_of_module(&ModuleId::new("g", "log-a"));
        assert_eq!(log_a.len(), 1);
        assert_eq!(log_a[0].component, module("g", "log-a", "1.0"));
        let log_b = graph.nodes_of_module(&ModuleId::new("g", "log-b"));
        assert_eq!(log_b.len(), 1);
        assert_eq!(log_b[0].component, module("g", "log-b", "2.0"));
        let root = graph.root().expect("root");
        assert!(
            graph
                .dependencies_of(root.id)
                .iter()
                .any(|n| n.component == module("g", "log-a", "1.0"))
        );
    }

    fn relocated_onto_root() -> Fixture {
        let fixture = Fixture::new(vec![dep("other:relocated:1.0")]);
        fixture.publish(
            ExternalModuleMetadata::new("other:relocated:1.0".parse().expect("id")).with_variant(
                VariantMetadata::new("runtime")
                    .with_attribute("usage", "runtime")
                    .with_capability(Capability::new("other", "relocated", Some("1.0".to_string())))
                    .with_capability(Capability::new("test", "app", Some("1.0".to_string()))),
            ),
        );
        fixture
    }

    #[test]
    fn root_keeps_its_capability() {
        let graph = relocated_onto_root()
            .resolve(&ResolutionStrategy::default())
            .expect("graph");

        assert_eq!(components(&graph), vec!["project :app"]);
        let root = graph.root().expect("root");
        assert!(root.reason.contains(SelectionCause::CapabilityConflict));
    }

    #[test]
    fn sharing_the_root_capability_fails_under_strict_strategy() {
        let err = relocated_onto_root()
            .resolve(&ResolutionStrategy::new(ConflictResolution::Strict))
            .expect_err("conflict");
        assert!(matches!(
            &err,
            GraftError::CapabilityConflict { capability, holders }
                if capability == "test:app" && holders.len() == 2
        ));
    }

    #[test]
    fn exclusions_apply_only_when_every_path_excludes() {
        let excluded = dep("g:a:1.0").excluding(ExcludeRule::module(&ModuleId::new("g", "c")));
        let fixture = Fixture::new(vec![excluded.clone()]);
        fixture.publish(library("g:a:1.0", vec![dep("g:c:1.0")]));
        fixture.publish(library("g:b:1.0", vec![dep("g:c:1.0")]));
        fixture.publish(library("g:c:1.0", vec![]));

        let graph = fixture.resolve(&ResolutionStrategy::default()).expect("graph");
        assert!(graph.nodes_of_module(&ModuleId::new("g", "c")).is_empty());

        let fixture = Fixture::new(vec![excluded, dep("g:b:1.0")]);
        fixture.publish(library("g:a:1.0", vec![dep("g:c:1.0")]));
        fixture.publish(library("g:b:1.0", vec![dep("g:c:1.0")]));
        fixture.publish(library("g:c:1.0", vec![]));

        let graph = fixture.resolve(&ResolutionStrategy::default()).expect("graph");
        assert_eq!(graph.nodes_of_module(&ModuleId::new("g", "c")).len(), 1);
    }

    #[test]
    fn exclusions_are_inherited_transitively() {
        let fixture = Fixture::new(vec![
            dep("g:a:1.0").excluding(ExcludeRule::group("org")),
        ]);
        fixture.publish(library("g:a:1.0", vec![dep("g:b:1.0")]));
        fixture.publish(library("g:b:1.0", vec![dep("org:c:1.0")]));
        fixture.publish(library("org:c:1.0", vec![]));

        let graph = fixture.resolve(&ResolutionStrategy::default()).expect("graph");
        assert_eq!(
            components(&graph),
            vec!["project :app", "g:a:1.0", "g:b:1.0"]
        );
    }

    #[test]
    fn substitution_redirects_to_project_and_records_rule() {
        let mut fixture = Fixture::new(vec![dep("g:old:1.0")]);
        fixture.project(
            ":lib",
            "lib",
            vec![ConfigurationDefinition::consumable("runtimeElements").with_attribute("usage", "runtime")],
        );
        let strategy = ResolutionStrategy::default().substituting(DependencySubstitution {
            module: ModuleId::new("g", "old"),
            version: None,
            replacement: ComponentSelector::project(":lib"),
            because: Some("built locally".to_string()),
        });

        let graph = fixture.resolve(&strategy).expect("graph");

        let lib_id = ComponentId::project(ROOT_BUILD_NAME, ":lib");
        let lib = graph.nodes_of(&lib_id).next().expect("lib node");
        assert_eq!(lib.variant, "runtimeElements");
        assert!(lib.reason.contains(SelectionCause::SelectedByRule));
        assert!(lib.reason.to_string().contains("built locally"));
        assert_eq!(graph.edges()[0].requested, "g:old:1.0");
    }

    #[test]
    fn forced_edge_beats_higher_version() {
        let fixture = Fixture::new(vec![dep("g:a:1.0").forced(), dep("g:b:1.0")]);
        fixture.publish(library("g:a:1.0", vec![]));
        fixture.publish(library("g:a:2.0", vec![]));
        fixture.publish(library("g:b:1.0", vec![dep("g:a:2.0")]));

        let graph = fixture.resolve(&ResolutionStrategy::default()).expect("graph");
        let a = graph.nodes_of_module(&ModuleId::new("g", "a"));
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].component, module("g", "a", "1.0"));
        assert!(a[0].reason.contains(SelectionCause::Forced));
    }

    #[test]
    fn strategy_forced_version_replaces_every_request() {
        let fixture = Fixture::new(vec![dep("g:a:1.0"), dep("g:b:1.0")]);
        fixture.publish(library("g:a:1.5", vec![]));
        fixture.publish(library("g:b:1.0", vec![dep("g:a:2.0")]));
        let strategy = ResolutionStrategy::default().forcing(&ModuleVersionId::new("g", "a", "1.5"));

        let graph = fixture.resolve(&strategy).expect("graph");
        let a = graph.nodes_of_module(&ModuleId::new("g", "a"));
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].component, module("g", "a", "1.5"));
    }

    #[test]
    fn strict_bounds_reject_higher_transitive_version() {
        let fixture = Fixture::new(vec![dep("g:a:[1.0,2.0)!!"), dep("g:b:1.0")]);
        for version in ["1.0", "1.5", "2.0"] {
            fixture.publish(library(&format!("g:a:{version}"), vec![]));
        }
        fixture.publish(library("g:b:1.0", vec![dep("g:a:2.0")]));

        let graph = fixture.resolve(&ResolutionStrategy::default()).expect("graph");
        let a = graph.nodes_of_module(&ModuleId::new("g", "a"));
        assert_eq!(a[0].component, module("g", "a", "1.5"));
    }

    #[test]
    fn incompatible_strict_bounds_fail() {
        let fixture = Fixture::new(vec![dep("g:a:1.0!!"), dep("g:b:1.0").endorsing_strict_versions()]);
        fixture.publish(library("g:a:1.0", vec![]));
        fixture.publish(library("g:a:2.0", vec![]));
        fixture.publish(library("g:b:1.0", vec![dep("g:a:2.0!!")]));

        let err = fixture.resolve(&ResolutionStrategy::default()).expect_err("conflict");
        assert!(matches!(err, GraftError::VersionConflict { .. }));
    }

    #[test]
    fn targeting_non_consumable_configuration_names_requester() {
        let mut fixture = Fixture::new(vec![
            DependencyMetadata::new(ComponentSelector::project(":lib")).targeting("internal"),
        ]);
        fixture.project(
            ":lib",
            "lib",
            vec![
                ConfigurationDefinition::consumable("runtimeElements").with_attribute("usage", "runtime"),
                ConfigurationDefinition::resolvable("internal"),
            ],
        );

        let err = fixture.resolve(&ResolutionStrategy::default()).expect_err("not consumable");
        assert!(matches!(
            &err,
            GraftError::ConfigurationNotConsumable { name, component, requester }
                if name == "internal" && component == "project :lib" && requester == "project :app"
        ));
    }

    #[test]
    fn projects_win_under_prefer_project_modules() {
        let mut fixture = Fixture::new(vec![
            DependencyMetadata::new(ComponentSelector::project(":lib")),
            dep("g:c:1.0"),
        ]);
        fixture.project(
            ":lib",
            "lib",
            vec![ConfigurationDefinition::consumable("runtimeElements").with_attribute("usage", "runtime")],
        );
        fixture.publish(library("g:c:1.0", vec![dep("test:lib:9.0")]));
        fixture.publish(library("test:lib:9.0", vec![]));

        let graph = fixture
            .resolve(&ResolutionStrategy::new(ConflictResolution::PreferProjectModules))
            .expect("graph");
        let lib = graph.nodes_of_module(&ModuleId::new("test", "lib"));
        assert_eq!(lib.len(), 1);
        assert!(lib[0].component.is_project());
    }

    #[test]
    fn replaced_module_yields_to_replacement() {
        let fixture = Fixture::new(vec![dep("g:old:1.0"), dep("g:new:2.0")]);
        fixture.publish(library("g:old:1.0", vec![]));
        fixture.publish(library("g:new:2.0", vec![]));
        let strategy =
            ResolutionStrategy::default().replacing(ModuleId::new("g", "old"), ModuleId::new("g", "new"));

        let graph = fixture.resolve(&strategy).expect("graph");
        assert_eq!(components(&graph), vec!["project :app", "g:new:2.0"]);
        let node = graph.nodes_of_module(&ModuleId::new("g", "new"))[0];
        assert!(node.reason.contains(SelectionCause::Replacement));
        assert_eq!(graph.edges().len(), 2);
    }

    #[test]
    fn equally_matching_variants_are_ambiguous() {
        let fixture = Fixture::new(vec![dep("g:a:1.0")]);
        fixture.publish(
            ExternalModuleMetadata::new("g:a:1.0".parse().expect("id"))
                .with_variant(VariantMetadata::new("jvm").with_attribute("usage", "runtime").with_attribute("platform", "jvm"))
                .with_variant(VariantMetadata::new("native").with_attribute("usage", "runtime").with_attribute("platform", "native")),
        );

        let err = fixture.resolve(&ResolutionStrategy::default()).expect_err("ambiguous");
        assert!(matches!(err, GraftError::AmbiguousVariantSelection { ref candidates, .. } if candidates.len() == 2));

        let disambiguated = ResolutionStrategy::default()
            .with_consumer_attributes(Attributes::empty().with("platform", "native"));
        let graph = fixture.resolve(&disambiguated).expect("graph");
        assert_eq!(graph.nodes()[1].variant, "native");
    }

    #[test]
    fn artifacts_are_collected_for_non_root_nodes() {
        let fixture = Fixture::new(vec![dep("g:a:1.0")]);
        fixture.publish(
            ExternalModuleMetadata::new("g:a:1.0".parse().expect("id")).with_variant(
                VariantMetadata::new("runtime")
                    .with_attribute("usage", "runtime")
                    .with_artifact(ArtifactMetadata::new("a-1.0")),
            ),
        );

        let mut artifacts = ResolvedArtifactsGraphVisitor::new();
        let _ = fixture
            .resolve_with(&ResolutionStrategy::default(), &mut artifacts)
            .expect("graph");
        assert_eq!(artifacts.file_names(), vec!["a-1.0.jar"]);
    }

    #[test]
    fn missing_root_variant_fails_before_visiting() {
        let fixture = Fixture::new(vec![]);
        let chain = fixture.chain();
        let root = chain
            .component_state(&ComponentId::project(ROOT_BUILD_NAME, ":app"))
            .expect("root");
        let mut operations = BuildOperationVisitor::new();
        let err = DependencyGraphBuilder::new(&ResolutionStrategy::default(), &chain)
            .resolve(&root, "compileClasspath", &mut operations)
            .expect_err("missing");
        assert!(matches!(err, GraftError::ConfigurationNotFound { .. }));
        assert!(operations.events().is_empty());
    }
}
