//! Mutable arena state of one graph build.

use std::collections::BTreeSet;
use std::sync::Arc;

use graft_common::capability::Capability;
use graft_common::types::{ComponentId, ComponentSelector, ModuleId, ModuleVersionId};
use graft_model::dependency::{DependencyMetadata, ExcludeRule};
use graft_model::state::VariantGraphResolveState;

use crate::reason::{SelectionDescriptor, SelectionReason};

pub(crate) type NodeId = usize;
pub(crate) type EdgeId = usize;

/// A (component, variant) pair admitted to the graph.
#[derive(Debug)]
pub(crate) struct NodeState {
    pub component: ComponentId,
    pub module_version: ModuleVersionId,
    /// Module key the component competes under, after replacements.
    pub module: ModuleId,
    pub variant: Arc<VariantGraphResolveState>,
    /// Declared capabilities, or the implicit one.
    pub capabilities: Vec<Capability>,
    pub incoming: Vec<EdgeId>,
    pub outgoing: Vec<EdgeId>,
    /// Exclusions inherited along every incoming path; `None` until attached.
    pub excludes: Option<BTreeSet<ExcludeRule>>,
    pub selected: bool,
    pub expanded: bool,
    pub queued: bool,
    /// Strict constraints declared by this node bind the graph.
    pub endorsing: bool,
    /// Causes specific to this node, merged with its module's reason.
    pub reason: SelectionReason,
}

impl NodeState {
    pub(crate) fn new(
        component: ComponentId,
        module_version: ModuleVersionId,
        module: ModuleId,
        variant: Arc<VariantGraphResolveState>,
    ) -> Self {
        let declared = variant.metadata().capabilities();
        let capabilities = if declared.is_empty() {
            vec![Capability::implicit(&module_version)]
        } else {
            declared.to_vec()
        };
        Self {
            component,
            module_version,
            module,
            variant,
            capabilities,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            excludes: None,
            selected: true,
            expanded: false,
            queued: false,
            endorsing: false,
            reason: SelectionReason::default(),
        }
    }

    /// Clears per-selection state when the node leaves the graph.
    pub(crate) fn deselect(&mut self) {
        self.selected = false;
        self.expanded = false;
        self.excludes = None;
        self.endorsing = false;
        self.reason = SelectionReason::default();
    }
}

/// One declared dependency of a selected node.
#[derive(Debug)]
pub(crate) struct EdgeState {
    pub from: NodeId,
    /// The selector as declared.
    pub requested: ComponentSelector,
    /// The dependency after substitution.
    pub dependency: DependencyMetadata,
    pub substitution: Option<SelectionDescriptor>,
    /// Module key of the candidate, after replacements.
    pub module: ModuleId,
    /// The component the selector resolved to.
    pub candidate: ComponentId,
    pub target: Option<NodeId>,
}

/// Selection state of one module key.
#[derive(Debug, Default)]
pub(crate) struct ModuleResolveState {
    /// Live edges pointing at the module.
    pub selectors: Vec<EdgeId>,
    pub selected: Option<ComponentId>,
    pub reason: SelectionReason,
    /// Node that took over the module after losing a capability conflict.
    pub replaced_by: Option<NodeId>,
}
