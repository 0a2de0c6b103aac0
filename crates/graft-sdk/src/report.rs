//! Serializable summaries of resolved graphs.

use graft_common::error::GraftError;
use graft_engine::graph::{DependencyGraphVisitor, ResolvedArtifactsGraphVisitor, ResolvedGraph};
use serde::Serialize;

/// One selected node of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Node id in the graph.
    pub id: usize,
    /// Selected component.
    pub component: String,
    /// Selected variant.
    pub variant: String,
    /// Why the component was selected.
    pub reason: String,
    /// Ids of the nodes this one depends on.
    pub dependencies: Vec<usize>,
}

/// Summary of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    /// Root component.
    pub root: String,
    /// Resolved configuration.
    pub configuration: String,
    /// Selected nodes, in creation order.
    pub nodes: Vec<ReportEntry>,
    /// Number of edges.
    pub edges: usize,
    /// Dependency cycles, as component names.
    pub cycles: Vec<Vec<String>>,
    /// Artifact file names of every selected variant except the root's.
    pub artifacts: Vec<String>,
    /// Failure message, if the graph is partial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ResolutionReport {
    /// Summarizes a complete graph.
    #[must_use]
    pub fn from_graph(graph: &ResolvedGraph, configuration: &str) -> Self {
        Self::summarize(graph, configuration, None)
    }

    /// Whether the resolution succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    fn summarize(graph: &ResolvedGraph, configuration: &str, failure: Option<&GraftError>) -> Self {
        let mut artifacts = ResolvedArtifactsGraphVisitor::new();
        graph.visit(&mut artifacts, failure);
        Self {
            root: graph
                .root()
                .map(|r| r.component.to_string())
                .unwrap_or_default(),
            configuration: configuration.to_string(),
            nodes: graph
                .nodes()
                .iter()
                .map(|node| ReportEntry {
                    id: node.id,
                    component: node.component.to_string(),
                    variant: node.variant.clone(),
                    reason: node.reason.to_string(),
                    dependencies: graph.outgoing(node.id).iter().map(|e| e.to).collect(),
                })
                .collect(),
            edges: graph.edges().len(),
            cycles: graph
                .cycles()
                .into_iter()
                .map(|cycle| cycle.iter().map(ToString::to_string).collect())
                .collect(),
            artifacts: artifacts.file_names(),
            failure: failure.map(ToString::to_string),
        }
    }
}

/// Builds a [`ResolutionReport`] when a traversal finishes, including the
/// partial graph of a failed resolution.
#[derive(Debug)]
pub struct ReportingVisitor {
    configuration: String,
    report: Option<ResolutionReport>,
}

impl ReportingVisitor {
    /// Creates a visitor reporting on `configuration`.
    #[must_use]
    pub fn new(configuration: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            report: None,
        }
    }

    /// Takes the report, once the traversal finished.
    pub fn into_report(self) -> Option<ResolutionReport> {
        self.report
    }
}

impl DependencyGraphVisitor for ReportingVisitor {
    fn finish(&mut self, graph: &ResolvedGraph, failure: Option<&GraftError>) {
        self.report = Some(ResolutionReport::summarize(graph, &self.configuration, failure));
    }
}
