//! Consumers of resolved graphs.
//!
//! Visitors see the graph once it is final, or the partial graph when the
//! resolution failed. Several visitors can share one traversal through a
//! [`CompositeDependencyGraphVisitor`].

use graft_common::error::GraftError;
use graft_common::types::ComponentId;
use graft_model::artifact::ArtifactMetadata;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::result::{ResolvedEdge, ResolvedGraph, ResolvedNode};

/// Callbacks invoked while walking a resolved graph.
pub trait DependencyGraphVisitor {
    /// Called once with the root node.
    fn start(&mut self, _root: &ResolvedNode) {}

    /// Called for every node, in creation order.
    fn visit_node(&mut self, _node: &ResolvedNode) {}

    /// Called for every node with outgoing edges, after all nodes were visited.
    fn visit_edges(&mut self, _node: &ResolvedNode, _edges: &[&ResolvedEdge]) {}

    /// Called last, with the failure if the resolution did not complete.
    fn finish(&mut self, _graph: &ResolvedGraph, _failure: Option<&GraftError>) {}
}

/// Fans every callback out to several visitors, in order.
#[derive(Default)]
pub struct CompositeDependencyGraphVisitor<'a> {
    delegates: Vec<&'a mut dyn DependencyGraphVisitor>,
}

impl<'a> CompositeDependencyGraphVisitor<'a> {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a delegate.
    #[must_use]
    pub fn with(mut self, visitor: &'a mut dyn DependencyGraphVisitor) -> Self {
        self.delegates.push(visitor);
        self
    }

    /// Number of delegates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    /// Whether there is no delegate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl DependencyGraphVisitor for CompositeDependencyGraphVisitor<'_> {
    fn start(&mut self, root: &ResolvedNode) {
        self.delegates.iter_mut().for_each(|v| v.start(root));
    }

    fn visit_node(&mut self, node: &ResolvedNode) {
        self.delegates.iter_mut().for_each(|v| v.visit_node(node));
    }

    fn visit_edges(&mut self, node: &ResolvedNode, edges: &[&ResolvedEdge]) {
        self.delegates.iter_mut().for_each(|v| v.visit_edges(node, edges));
    }

    fn finish(&mut self, graph: &ResolvedGraph, failure: Option<&GraftError>) {
        self.delegates.iter_mut().for_each(|v| v.finish(graph, failure));
    }
}

/// One artifact of a selected variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifact {
    /// Owning component.
    pub component: ComponentId,
    /// Owning variant.
    pub variant: String,
    /// The artifact.
    pub artifact: ArtifactMetadata,
}

/// Collects the artifacts of every selected variant except the root's.
#[derive(Debug, Default)]
pub struct ResolvedArtifactsGraphVisitor {
    root: Option<usize>,
    artifacts: Vec<ResolvedArtifact>,
}

impl ResolvedArtifactsGraphVisitor {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected artifacts, in node order.
    #[must_use]
    pub fn artifacts(&self) -> &[ResolvedArtifact] {
        &self.artifacts
    }

    /// File names of the collected artifacts.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        self.artifacts.iter().map(|a| a.artifact.file_name()).collect()
    }
}

impl DependencyGraphVisitor for ResolvedArtifactsGraphVisitor {
    fn start(&mut self, root: &ResolvedNode) {
        self.root = Some(root.id);
    }

    fn visit_node(&mut self, node: &ResolvedNode) {
        if self.root == Some(node.id) {
            return;
        }
        let resolved = node.state.resolve_artifacts();
        self.artifacts
            .extend(resolved.artifacts.iter().map(|artifact| ResolvedArtifact {
                component: node.component.clone(),
                variant: resolved.variant.clone(),
                artifact: artifact.clone(),
            }));
    }
}

/// A structured record of one resolution step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ResolutionEvent {
    /// Traversal started.
    Started {
        /// Root component.
        root: String,
        /// Root variant.
        variant: String,
    },
    /// A node was visited.
    NodeResolved {
        /// Selected component.
        component: String,
        /// Selected variant.
        variant: String,
        /// Selection reason.
        reason: String,
    },
    /// The outgoing edges of a node were visited.
    DependenciesResolved {
        /// Dependent component.
        component: String,
        /// Number of outgoing edges.
        count: usize,
    },
    /// Traversal finished.
    Finished {
        /// Number of nodes.
        nodes: usize,
        /// Number of edges.
        edges: usize,
        /// Failure message, if the resolution failed.
        failure: Option<String>,
    },
}

/// Emits traversal events through `tracing` and records them.
#[derive(Debug, Default)]
pub struct BuildOperationVisitor {
    events: Vec<ResolutionEvent>,
}

impl BuildOperationVisitor {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, in order.
    #[must_use]
    pub fn events(&self) -> &[ResolutionEvent] {
        &self.events
    }

    /// Takes the recorded events.
    pub fn take_events(&mut self) -> Vec<ResolutionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl DependencyGraphVisitor for BuildOperationVisitor {
    fn start(&mut self, root: &ResolvedNode) {
        info!(root = %root.component, variant = %root.variant, "resolve dependencies started");
        self.events.push(ResolutionEvent::Started {
            root: root.component.to_string(),
            variant: root.variant.clone(),
        });
    }

    fn visit_node(&mut self, node: &ResolvedNode) {
        debug!(
            component = %node.component,
            variant = %node.variant,
            reason = %node.reason,
            "node resolved"
        );
        self.events.push(ResolutionEvent::NodeResolved {
            component: node.component.to_string(),
            variant: node.variant.clone(),
            reason: node.reason.to_string(),
        });
    }

    fn visit_edges(&mut self, node: &ResolvedNode, edges: &[&ResolvedEdge]) {
        self.events.push(ResolutionEvent::DependenciesResolved {
            component: node.component.to_string(),
            count: edges.len(),
        });
    }

    fn finish(&mut self, graph: &ResolvedGraph, failure: Option<&GraftError>) {
        match failure {
            Some(err) => warn!(nodes = graph.nodes().len(), error = %err, "resolve dependencies failed"),
            None => info!(
                nodes = graph.nodes().len(),
                edges = graph.edges().len(),
                "resolve dependencies finished"
            ),
        }
        self.events.push(ResolutionEvent::Finished {
            nodes: graph.nodes().len(),
            edges: graph.edges().len(),
            failure: failure.map(ToString::to_string),
        });
    }
}

/// Serializes the graph to JSON when the traversal finishes.
#[derive(Debug, Default)]
pub struct SerializingGraphVisitor {
    json: Option<serde_json::Value>,
    failure: Option<String>,
}

impl SerializingGraphVisitor {
    /// Creates an empty serializer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The serialized graph, once finished.
    #[must_use]
    pub const fn json(&self) -> Option<&serde_json::Value> {
        self.json.as_ref()
    }

    /// The failure message, if the resolution failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Takes the serialized graph.
    pub fn into_json(self) -> Option<serde_json::Value> {
        self.json
    }
}

impl DependencyGraphVisitor for SerializingGraphVisitor {
    fn finish(&mut self, graph: &ResolvedGraph, failure: Option<&GraftError>) {
        self.failure = failure.map(ToString::to_string);
        match serde_json::to_value(graph) {
            Ok(value) => self.json = Some(value),
            Err(err) => warn!(error = %err, "cannot serialize resolved graph"),
        }
    }
}
