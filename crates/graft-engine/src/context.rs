//! What a resolution is about, as seen by resolver factories.

use graft_common::types::ComponentId;

use crate::strategy::ResolutionStrategy;

/// Describes one resolution request.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Root component.
    pub root: &'a ComponentId,
    /// Name of the root variant.
    pub root_variant: &'a str,
    /// Strategy in effect.
    pub strategy: &'a ResolutionStrategy,
}

impl<'a> ResolveContext<'a> {
    /// Creates a context.
    #[must_use]
    pub const fn new(
        root: &'a ComponentId,
        root_variant: &'a str,
        strategy: &'a ResolutionStrategy,
    ) -> Self {
        Self {
            root,
            root_variant,
            strategy,
        }
    }

    /// Whether the root is a local project.
    #[must_use]
    pub const fn is_project_resolution(&self) -> bool {
        self.root.is_project()
    }
}
