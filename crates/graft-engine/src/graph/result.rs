//! The resolved dependency graph.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use graft_common::attributes::Attributes;
use graft_common::capability::Capability;
use graft_common::error::{GraftError, Result};
use graft_common::types::{ComponentId, ModuleId, ModuleVersionId};
use graft_model::state::VariantGraphResolveState;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::visitor::DependencyGraphVisitor;
use crate::reason::SelectionReason;

/// A selected (component, variant) pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNode {
    /// Node id, increasing in creation order within one resolution.
    pub id: usize,
    /// Selected component.
    pub component: ComponentId,
    /// Module coordinates of the component.
    pub module_version: ModuleVersionId,
    /// Selected variant.
    pub variant: String,
    /// Attributes of the selected variant.
    pub attributes: Attributes,
    /// Capabilities of the selected variant; empty means the implicit one.
    pub capabilities: Vec<Capability>,
    /// Why the component was selected.
    pub reason: SelectionReason,
    /// Resolve state of the selected variant.
    #[serde(skip)]
    pub state: Arc<VariantGraphResolveState>,
}

/// A dependency from one node to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEdge {
    /// Dependent node.
    pub from: usize,
    /// Selected target node.
    pub to: usize,
    /// The selector as declared, before substitution.
    pub requested: String,
}

/// A resolved (or partially resolved) dependency graph.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedGraph {
    root: usize,
    nodes: Vec<ResolvedNode>,
    edges: Vec<ResolvedEdge>,
}

impl ResolvedGraph {
    pub(crate) fn new(root: usize, nodes: Vec<ResolvedNode>, edges: Vec<ResolvedEdge>) -> Self {
        Self { root, nodes, edges }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> Option<&ResolvedNode> {
        self.node(self.root)
    }

    /// All nodes, in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[ResolvedNode] {
        &self.nodes
    }

    /// All edges.
    #[must_use]
    pub fn edges(&self) -> &[ResolvedEdge] {
        &self.edges
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: usize) -> Option<&ResolvedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes of one component.
    pub fn nodes_of<'a>(&'a self, component: &'a ComponentId) -> impl Iterator<Item = &'a ResolvedNode> {
        self.nodes.iter().filter(move |n| &n.component == component)
    }

    /// Nodes whose module coordinates belong to `module`.
    #[must_use]
    pub fn nodes_of_module(&self, module: &ModuleId) -> Vec<&ResolvedNode> {
        self.nodes
            .iter()
            .filter(|n| n.module_version.module() == module)
            .collect()
    }

    /// Distinct selected components.
    #[must_use]
    pub fn components(&self) -> BTreeSet<&ComponentId> {
        self.nodes.iter().map(|n| &n.component).collect()
    }

    /// Outgoing edges of a node.
    #[must_use]
    pub fn outgoing(&self, id: usize) -> Vec<&ResolvedEdge> {
        self.edges.iter().filter(|e| e.from == id).collect()
    }

    /// Direct dependencies of a node.
    #[must_use]
    pub fn dependencies_of(&self, id: usize) -> Vec<&ResolvedNode> {
        self.outgoing(id)
            .into_iter()
            .filter_map(|e| self.node(e.to))
            .collect()
    }

    /// Groups of components that depend on each other, for diagnostics.
    ///
    /// Each group is sorted; groups are listed in discovery order.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<ComponentId>> {
        let mut graph = DiGraph::<usize, ()>::new();
        let indices: HashMap<usize, NodeIndex> = self
            .nodes
            .iter()
            .map(|n| (n.id, graph.add_node(n.id)))
            .collect();
        for edge in &self.edges {
            if let (Some(&from), Some(&to)) = (indices.get(&edge.from), indices.get(&edge.to)) {
                let _ = graph.add_edge(from, to, ());
            }
        }
        tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || scc.iter().any(|&i| graph.contains_edge(i, i)))
            .map(|scc| {
                let components: BTreeSet<ComponentId> = scc
                    .iter()
                    .filter_map(|&i| self.node(graph[i]))
                    .map(|n| n.component.clone())
                    .collect();
                components.into_iter().collect()
            })
            .collect()
    }

    /// Walks the graph: `start`, every node, every node's edges, `finish`.
    pub fn visit(&self, visitor: &mut dyn DependencyGraphVisitor, failure: Option<&GraftError>) {
        if let Some(root) = self.root() {
            visitor.start(root);
        }
        for node in &self.nodes {
            visitor.visit_node(node);
        }
        for node in &self.nodes {
            let outgoing = self.outgoing(node.id);
            if !outgoing.is_empty() {
                visitor.visit_edges(node, &outgoing);
            }
        }
        visitor.finish(self, failure);
    }

    /// Renders the graph as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
